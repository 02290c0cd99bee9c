//! OnnxForge Quant - Model Compression
//!
//! Weight compression passes over ONNX models: dynamic 8-bit weight
//! quantization in dequantize-linear form, and float32 to float16
//! conversion with range saturation.
//!
//! # Example
//! ```ignore
//! use onnxforge_onnx::load_model;
//! use onnxforge_quant::{quantize_model_weights, QuantConfig};
//!
//! let mut model = load_model("model.onnx")?;
//! let summary = quantize_model_weights(&mut model, &QuantConfig::dynamic())?;
//! ```
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fp16;
pub mod quantize;
pub mod types;

pub use error::{QuantError, QuantResult};
pub use fp16::convert_to_fp16;
pub use quantize::quantize_model_weights;
pub use types::{
    Fp16Config, Fp16Summary, QuantConfig, QuantSummary, WeightType, DYNAMIC_QUANT_OPS,
    PER_CHANNEL_QUANT_OPS,
};
