//! Quantize Command - Opset Upgrade + Dynamic Quantization
//!
//! Upgrades the input model to opset 19, writes the upgraded model next to
//! the input as `{stem}_opset19.onnx`, quantizes its weights to 8 bits, and
//! writes the result to the output path. The intermediate file is removed
//! once the output is saved, and left in place when a later step fails so
//! the upgrade does not have to be repeated.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::path::{Path, PathBuf};

use onnxforge_onnx::{load_model, save_model, TARGET_OPSET_VERSION};
use onnxforge_onnx::opset::upgrade_opset;
use onnxforge_quant::{quantize_model_weights, QuantConfig, WeightType};

use crate::cli::QuantizeArgs;
use crate::commands::utils;
use crate::error::{CliError, CliResult};

/// Execute the quantize command
pub fn execute(args: QuantizeArgs) -> CliResult<()> {
    let mut config = QuantConfig::dynamic();
    config.weight_type = WeightType::parse(&args.weight_type)?;

    let mut model = load_model(&args.input)?;
    let original_mb = utils::file_size_mb(&args.input)?;
    utils::print_verbose(&format!(
        "loaded {} (opset {})",
        args.input.display(),
        model.opset_version()
    ));

    utils::print_step(1, 3, &format!("Upgrading to opset {TARGET_OPSET_VERSION}"));
    upgrade_opset(&mut model, TARGET_OPSET_VERSION)?;

    let intermediate = intermediate_path(&args.input)?;
    save_model(&model, &intermediate)?;
    utils::print_verbose(&format!("wrote intermediate {}", intermediate.display()));

    utils::print_step(2, 3, "Quantizing weights to 8 bits");
    let pb = utils::spinner("quantizing...");
    let summary = quantize_model_weights(&mut model, &config)?;
    pb.finish_and_clear();
    if summary.quantized == 0 {
        utils::print_warning("no weights matched the quantization allow-list");
    }
    utils::print_info(&format!(
        "{} weight tensors quantized ({} skipped)",
        summary.quantized, summary.skipped
    ));

    utils::print_step(3, 3, "Saving quantized model");
    save_model(&model, &args.output)?;

    // The upgraded copy is only a stepping stone once the output exists.
    std::fs::remove_file(&intermediate)?;

    let output_mb = utils::file_size_mb(&args.output)?;
    utils::print_size_report(original_mb, output_mb);
    utils::print_success(&format!("Quantized model saved to {}", args.output.display()));
    Ok(())
}

/// Path of the opset-upgraded intermediate, next to the input model.
pub fn intermediate_path(input: &Path) -> CliResult<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("input path has no file name: {}", input.display()))
        })?;
    Ok(input.with_file_name(format!("{stem}_opset{TARGET_OPSET_VERSION}.onnx")))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use onnxforge_onnx::proto::{
        GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorDataType, TensorProto,
        ValueInfo,
    };

    fn small_matmul_model(opset: i64) -> ModelProto {
        ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: opset,
            }],
            graph: Some(GraphProto {
                node: vec![NodeProto::new("MatMul", &["x", "w"], &["y"])],
                initializer: vec![TensorProto::float(
                    "w",
                    &[4, 4],
                    (0..16).map(|i| i as f32 * 0.1).collect(),
                )],
                input: vec![ValueInfo::tensor("x", TensorDataType::Float, &[1, 4])],
                output: vec![ValueInfo::tensor("y", TensorDataType::Float, &[1, 4])],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_quantize_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("model_quant.onnx");
        save_model(&small_matmul_model(13), &input).unwrap();

        execute(QuantizeArgs {
            input: input.clone(),
            output: output.clone(),
            weight_type: "quint8".to_string(),
        })
        .unwrap();

        assert!(output.is_file());
        // Intermediate cleaned up on success.
        assert!(!dir.path().join("model_opset19.onnx").exists());

        let result = load_model(&output).unwrap();
        assert_eq!(result.opset_version(), 19);
        let graph = result.graph.as_ref().unwrap();
        assert!(graph
            .node
            .iter()
            .any(|n| n.op_type == "DequantizeLinear"));
        assert!(graph.get_initializer("w").is_none());
        assert!(graph.get_initializer("w_quantized").is_some());
    }

    #[test]
    fn test_quantized_output_is_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("model_quant.onnx");

        let mut model = small_matmul_model(19);
        model
            .graph
            .as_mut()
            .unwrap()
            .initializer
            .push(TensorProto::float(
                "w2",
                &[64, 64],
                vec![0.25; 64 * 64],
            ));
        model
            .graph
            .as_mut()
            .unwrap()
            .node
            .push(NodeProto::new("MatMul", &["y", "w2"], &["z"]));
        save_model(&model, &input).unwrap();

        execute(QuantizeArgs {
            input: input.clone(),
            output: output.clone(),
            weight_type: "quint8".to_string(),
        })
        .unwrap();

        let original = std::fs::metadata(&input).unwrap().len();
        let quantized = std::fs::metadata(&output).unwrap().len();
        assert!(quantized < original / 2);
    }

    #[test]
    fn test_no_matching_weights_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("out.onnx");

        let mut model = small_matmul_model(13);
        model.graph.as_mut().unwrap().node[0].op_type = "CustomOp".to_string();
        save_model(&model, &input).unwrap();

        execute(QuantizeArgs {
            input,
            output: output.clone(),
            weight_type: "quint8".to_string(),
        })
        .unwrap();

        let result = load_model(&output).unwrap();
        let graph = result.graph.as_ref().unwrap();
        assert!(!graph.node.iter().any(|n| n.op_type == "DequantizeLinear"));
        assert!(graph.get_initializer("w").is_some());
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(QuantizeArgs {
            input: dir.path().join("missing.onnx"),
            output: dir.path().join("out.onnx"),
            weight_type: "quint8".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("missing.onnx"));
        assert!(!dir.path().join("out.onnx").exists());
    }

    #[test]
    fn test_intermediate_path_uses_input_stem() {
        let path = intermediate_path(Path::new("/models/resnet.onnx")).unwrap();
        assert_eq!(path, PathBuf::from("/models/resnet_opset19.onnx"));
    }
}
