//! Quantization Error Types
//!
//! Error types for quantization and float16 conversion.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use thiserror::Error;

/// Result type for quantization operations.
pub type QuantResult<T> = Result<T, QuantError>;

/// Errors that can occur during quantization or float16 conversion.
#[derive(Error, Debug)]
pub enum QuantError {
    /// The model has no graph to quantize.
    #[error("Model has no graph")]
    MissingGraph,

    /// The model opset is too old for the requested quantization mode.
    #[error("Model opset {found} is too old: {mode} quantization requires opset {required}")]
    OpsetTooOld {
        /// Opset version found in the model.
        found: i64,
        /// Minimum opset version required.
        required: i64,
        /// Quantization mode that imposed the requirement.
        mode: &'static str,
    },

    /// Unknown weight type name.
    #[error("Unknown weight type: {0}")]
    UnknownWeightType(String),

    /// Initializer payload does not match its declared shape.
    #[error("Initializer '{name}' holds {actual} values but its shape implies {expected}")]
    DataLengthMismatch {
        /// Initializer name.
        name: String,
        /// Element count the dims imply.
        expected: usize,
        /// Element count actually present.
        actual: usize,
    },

    /// Invalid quantization axis for a tensor shape.
    #[error("Quantization axis {axis} out of range for tensor of rank {rank}")]
    InvalidAxis {
        /// Requested axis.
        axis: usize,
        /// Tensor rank.
        rank: usize,
    },
}
