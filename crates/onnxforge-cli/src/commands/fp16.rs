//! Fp16 Command - Float32 to Float16 Conversion
//!
//! Converts every float32 tensor in the input model to float16 and writes
//! the result to the output path. Graph inputs and outputs stay float32
//! behind boundary Cast nodes unless `--no-keep-io-types` is given.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use onnxforge_onnx::{load_model, save_model};
use onnxforge_quant::{convert_to_fp16, Fp16Config};

use crate::cli::Fp16Args;
use crate::commands::utils;
use crate::error::CliResult;

/// Execute the fp16 command
pub fn execute(args: Fp16Args) -> CliResult<()> {
    let mut model = load_model(&args.input)?;
    let original_mb = utils::file_size_mb(&args.input)?;
    utils::print_verbose(&format!(
        "loaded {} (opset {})",
        args.input.display(),
        model.opset_version()
    ));

    utils::print_step(1, 2, "Converting tensors to float16");
    let config = Fp16Config {
        keep_io_types: !args.no_keep_io_types,
    };
    let pb = utils::spinner("converting...");
    let summary = convert_to_fp16(&mut model, &config)?;
    pb.finish_and_clear();
    utils::print_info(&format!(
        "{} tensors converted, {} boundary casts inserted",
        summary.converted, summary.casts_inserted
    ));

    utils::print_step(2, 2, "Saving converted model");
    save_model(&model, &args.output)?;

    let output_mb = utils::file_size_mb(&args.output)?;
    utils::print_size_report(original_mb, output_mb);
    utils::print_success(&format!("Float16 model saved to {}", args.output.display()));
    Ok(())
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

    fn float_model() -> ModelProto {
        ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 19,
            }],
            graph: Some(GraphProto {
                node: vec![NodeProto::new("Add", &["x", "w"], &["y"])],
                initializer: vec![TensorProto::float(
                    "w",
                    &[128],
                    vec![0.5; 128],
                )],
                input: vec![ValueInfo::tensor("x", TensorDataType::Float, &[128])],
                output: vec![ValueInfo::tensor("y", TensorDataType::Float, &[128])],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_fp16_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("model_fp16.onnx");
        save_model(&float_model(), &input).unwrap();

        execute(Fp16Args {
            input: input.clone(),
            output: output.clone(),
            no_keep_io_types: false,
        })
        .unwrap();

        let result = load_model(&output).unwrap();
        let graph = result.graph.as_ref().unwrap();
        let w = graph.get_initializer("w").unwrap();
        assert_eq!(w.data_type, TensorDataType::Float16 as i32);
        assert_eq!(w.raw_data.len(), 256);
        // Signature preserved behind boundary casts.
        assert_eq!(graph.input[0].elem_type(), Some(TensorDataType::Float as i32));
        assert!(graph.node.iter().any(|n| n.op_type == "Cast"));
    }

    #[test]
    fn test_no_keep_io_types_flips_signature() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("model_fp16.onnx");
        save_model(&float_model(), &input).unwrap();

        execute(Fp16Args {
            input,
            output: output.clone(),
            no_keep_io_types: true,
        })
        .unwrap();

        let result = load_model(&output).unwrap();
        let graph = result.graph.as_ref().unwrap();
        assert_eq!(
            graph.input[0].elem_type(),
            Some(TensorDataType::Float16 as i32)
        );
        assert!(!graph.node.iter().any(|n| n.op_type == "Cast"));
    }

    #[test]
    fn test_fp16_output_is_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.onnx");
        let output = dir.path().join("model_fp16.onnx");
        save_model(&float_model(), &input).unwrap();

        execute(Fp16Args {
            input: input.clone(),
            output: output.clone(),
            no_keep_io_types: true,
        })
        .unwrap();

        let original = std::fs::metadata(&input).unwrap().len();
        let converted = std::fs::metadata(&output).unwrap().len();
        assert!(converted < original);
    }
}
