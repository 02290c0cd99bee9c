//! Error - CLI Error Types
//!
//! Defines error types for CLI operations.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use thiserror::Error;

use onnxforge_onnx::OnnxError;
use onnxforge_quant::QuantError;

// =============================================================================
// Error Types
// =============================================================================

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Model loading or saving error
    #[error("Model error: {0}")]
    Model(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission denied writing the output
    #[error("Permission denied: {0} (check file permissions for the output location)")]
    PermissionDenied(String),

    /// Quantization error
    #[error("Quantization error: {0}")]
    Quantization(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

// =============================================================================
// Error Conversion
// =============================================================================

impl From<OnnxError> for CliError {
    fn from(e: OnnxError) -> Self {
        if e.is_permission_denied() {
            CliError::PermissionDenied(e.to_string())
        } else {
            CliError::Model(e.to_string())
        }
    }
}

impl From<QuantError> for CliError {
    fn from(e: QuantError) -> Self {
        match e {
            QuantError::UnknownWeightType(_) => CliError::InvalidArgument(e.to_string()),
            _ => CliError::Quantization(e.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_error_gets_hint() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CliError::from(OnnxError::Io(io));
        let message = err.to_string();
        assert!(message.contains("Permission denied"));
        assert!(message.contains("check file permissions"));
    }

    #[test]
    fn test_missing_model_maps_to_model_error() {
        let err = CliError::from(OnnxError::ModelNotFound("missing.onnx".into()));
        assert!(matches!(err, CliError::Model(_)));
        assert!(err.to_string().contains("missing.onnx"));
    }

    #[test]
    fn test_quant_error_mapped() {
        let err = CliError::from(QuantError::MissingGraph);
        assert!(matches!(err, CliError::Quantization(_)));
    }
}
