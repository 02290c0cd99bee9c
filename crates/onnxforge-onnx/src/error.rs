//! ONNX Error Types
//!
//! Error types for ONNX load/save and graph transformation operations.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ONNX operations.
pub type OnnxResult<T> = Result<T, OnnxError>;

/// Errors that can occur during ONNX operations.
#[derive(Error, Debug)]
pub enum OnnxError {
    /// Input model file does not exist.
    #[error("Input model not found: {0}")]
    ModelNotFound(PathBuf),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse ONNX protobuf.
    #[error("Failed to parse ONNX protobuf: {0}")]
    ProtobufParse(String),

    /// Failed to encode ONNX protobuf.
    #[error("Failed to encode ONNX protobuf: {0}")]
    ProtobufEncode(String),

    /// Unsupported ONNX IR version.
    #[error("Unsupported ONNX IR version: {0}")]
    UnsupportedIrVersion(i64),

    /// Opset downgrade requested.
    #[error("Cannot downgrade opset from {from} to {to}")]
    OpsetDowngrade {
        /// Current opset version.
        from: i64,
        /// Requested opset version.
        to: i64,
    },

    /// Invalid tensor shape.
    #[error("Invalid tensor shape: {0}")]
    InvalidShape(String),

    /// Invalid tensor data type.
    #[error("Invalid tensor data type: {0}")]
    InvalidDataType(i32),

    /// Graph validation error.
    #[error("Graph validation error: {0}")]
    GraphValidation(String),
}

impl From<prost::DecodeError> for OnnxError {
    fn from(err: prost::DecodeError) -> Self {
        OnnxError::ProtobufParse(err.to_string())
    }
}

impl From<prost::EncodeError> for OnnxError {
    fn from(err: prost::EncodeError) -> Self {
        OnnxError::ProtobufEncode(err.to_string())
    }
}

impl OnnxError {
    /// Returns true if this error wraps a filesystem permission failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, OnnxError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }
}
