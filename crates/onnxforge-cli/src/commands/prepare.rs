//! Prepare Command - Preprocessing + Per-Channel Quantization
//!
//! Runs the graph preprocessing passes (passthrough-node elimination, shape
//! inference, initializer pruning), writes the cleaned model next to the
//! input as `{stem}_preprocessed.onnx`, then quantizes weights per channel
//! and writes the result to the output path. `--skip-preprocess` quantizes
//! the input directly without the intermediate.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::path::{Path, PathBuf};

use onnxforge_onnx::{load_model, preprocess, save_model};
use onnxforge_quant::{quantize_model_weights, QuantConfig};

use crate::cli::PrepareArgs;
use crate::commands::utils;
use crate::error::{CliError, CliResult};

/// Execute the prepare command
pub fn execute(args: PrepareArgs) -> CliResult<()> {
    let mut model = load_model(&args.input)?;
    let original_mb = utils::file_size_mb(&args.input)?;
    utils::print_verbose(&format!(
        "loaded {} (opset {})",
        args.input.display(),
        model.opset_version()
    ));

    let total = if args.skip_preprocess { 2 } else { 3 };
    let mut step = 0;

    let intermediate = if args.skip_preprocess {
        None
    } else {
        step += 1;
        utils::print_step(step, total, "Preprocessing graph");
        preprocess(&mut model)?;

        let path = intermediate_path(&args.input)?;
        save_model(&model, &path)?;
        utils::print_verbose(&format!("wrote intermediate {}", path.display()));
        Some(path)
    };

    step += 1;
    utils::print_step(step, total, "Quantizing weights per channel");
    let pb = utils::spinner("quantizing...");
    let summary = quantize_model_weights(&mut model, &QuantConfig::per_channel())?;
    pb.finish_and_clear();
    if summary.quantized == 0 {
        utils::print_warning("no weights matched the quantization allow-list");
    }
    utils::print_info(&format!(
        "{} weight tensors quantized ({} skipped)",
        summary.quantized, summary.skipped
    ));

    step += 1;
    utils::print_step(step, total, "Saving quantized model");
    save_model(&model, &args.output)?;

    if let Some(path) = intermediate {
        std::fs::remove_file(&path)?;
    }

    let output_mb = utils::file_size_mb(&args.output)?;
    utils::print_size_report(original_mb, output_mb);
    utils::print_success(&format!("Quantized model saved to {}", args.output.display()));
    Ok(())
}

/// Path of the preprocessed intermediate, next to the input model.
pub fn intermediate_path(input: &Path) -> CliResult<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("input path has no file name: {}", input.display()))
        })?;
    Ok(input.with_file_name(format!("{stem}_preprocessed.onnx")))
}

// =============================================================================
// Tests
// =============================================================================
