//! CLI - Command Line Interface Definitions
//!
//! Defines the CLI structure using clap derive macros.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// OnnxForge - ONNX model compression toolkit
#[derive(Parser, Debug)]
#[command(
    name = "onnxforge",
    author = "OnnxForge Development Team",
    version,
    about = "OnnxForge CLI - Quantize and convert ONNX models",
    long_about = "OnnxForge compresses ONNX models for deployment.\n\n\
                  Upgrade opsets and quantize weights to 8 bits, preprocess graphs \
                  before quantization, or convert models to float16."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upgrade a model to opset 19 and quantize weights to 8 bits
    Quantize(QuantizeArgs),

    /// Preprocess a model and quantize weights per channel
    Prepare(PrepareArgs),

    /// Convert a model's float32 tensors to float16
    Fp16(Fp16Args),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the quantize command
#[derive(Parser, Debug)]
pub struct QuantizeArgs {
    /// Path to the input ONNX model
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the quantized output model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Storage type for quantized weights (quint8 or qint8)
    #[arg(long, default_value = "quint8")]
    pub weight_type: String,
}

/// Arguments for the prepare command
#[derive(Parser, Debug)]
pub struct PrepareArgs {
    /// Path to the input ONNX model
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the quantized output model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Quantize without running the preprocessing passes
    #[arg(long)]
    pub skip_preprocess: bool,
}

/// Arguments for the fp16 command
#[derive(Parser, Debug)]
pub struct Fp16Args {
    /// Path to the input ONNX model
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the converted output model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Convert graph inputs and outputs to float16 as well
    #[arg(long)]
    pub no_keep_io_types: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_args_parse() {
        let cli = Cli::parse_from([
            "onnxforge",
            "quantize",
            "--input",
            "model.onnx",
            "--output",
            "model_quant.onnx",
        ]);
        match cli.command {
            Commands::Quantize(args) => {
                assert_eq!(args.input, PathBuf::from("model.onnx"));
                assert_eq!(args.output, PathBuf::from("model_quant.onnx"));
                assert_eq!(args.weight_type, "quint8");
            }
            _ => panic!("expected quantize subcommand"),
        }
    }

    #[test]
    fn test_missing_output_rejected() {
        let result = Cli::try_parse_from(["onnxforge", "quantize", "--input", "model.onnx"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from([
            "onnxforge",
            "quantize",
            "-i",
            "a.onnx",
            "-o",
            "b.onnx",
            "--verbose",
        ]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_prepare_skip_preprocess_flag() {
        let cli = Cli::parse_from([
            "onnxforge",
            "prepare",
            "-i",
            "a.onnx",
            "-o",
            "b.onnx",
            "--skip-preprocess",
        ]);
        match cli.command {
            Commands::Prepare(args) => assert!(args.skip_preprocess),
            _ => panic!("expected prepare subcommand"),
        }
    }

    #[test]
    fn test_fp16_defaults_keep_io_types() {
        let cli = Cli::parse_from(["onnxforge", "fp16", "-i", "a.onnx", "-o", "b.onnx"]);
        match cli.command {
            Commands::Fp16(args) => assert!(!args.no_keep_io_types),
            _ => panic!("expected fp16 subcommand"),
        }
    }
}
