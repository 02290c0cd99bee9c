//! OnnxForge CLI - Command Line Interface for ONNX Model Compression
//!
//! The main entry point for the onnxforge command-line tool.
//!
//! # Commands
//! - `onnxforge quantize` - Upgrade to opset 19 and quantize weights to 8 bits
//! - `onnxforge prepare` - Preprocess a model and quantize weights per channel
//! - `onnxforge fp16` - Convert float32 tensors to float16
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// CLI-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;
mod error;

use cli::{Cli, Commands};
use error::CliResult;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.quiet {
        commands::utils::set_quiet(true);
    }
    if cli.verbose {
        commands::utils::set_verbose(true);
    }

    match cli.command {
        Commands::Quantize(args) => commands::quantize::execute(args),
        Commands::Prepare(args) => commands::prepare::execute(args),
        Commands::Fp16(args) => commands::fp16::execute(args),
    }
}
