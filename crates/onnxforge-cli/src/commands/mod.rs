//! Commands - CLI Command Implementations
//!
//! Each submodule implements one onnxforge subcommand.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

pub mod fp16;
pub mod prepare;
pub mod quantize;
pub mod utils;
