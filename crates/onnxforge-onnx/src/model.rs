//! ONNX Model I/O
//!
//! Loads and saves ONNX model files and validates their structure.
//! Binary protobuf is the primary format; JSON-encoded models are also
//! accepted, which keeps fixtures and debugging dumps human-readable.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::fs;
use std::path::Path;

use prost::Message;

use crate::error::{OnnxError, OnnxResult};
use crate::proto::ModelProto;
use crate::MIN_IR_VERSION;

// =============================================================================
// Loading
// =============================================================================

/// Loads an ONNX model from a file path.
///
/// Returns `OnnxError::ModelNotFound` when the path is not a regular file,
/// before anything else happens.
///
/// # Example
/// ```ignore
/// use onnxforge_onnx::load_model;
///
/// let model = load_model("model.onnx")?;
/// println!("opset {}", model.opset_version());
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> OnnxResult<ModelProto> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(OnnxError::ModelNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    load_model_bytes(&bytes)
}

/// Loads an ONNX model from raw bytes.
pub fn load_model_bytes(bytes: &[u8]) -> OnnxResult<ModelProto> {
    let model = if bytes.starts_with(b"{") {
        // JSON format
        serde_json::from_slice(bytes)
            .map_err(|e| OnnxError::ProtobufParse(format!("JSON parse error: {e}")))?
    } else {
        ModelProto::decode(bytes)?
    };

    validate_model(&model)?;
    Ok(model)
}

// =============================================================================
// Saving
// =============================================================================

/// Saves an ONNX model to a file path, creating parent directories as needed.
pub fn save_model<P: AsRef<Path>>(model: &ModelProto, path: P) -> OnnxResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = model.encode_to_vec();
    fs::write(path, bytes)?;
    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a parsed ONNX model.
fn validate_model(model: &ModelProto) -> OnnxResult<()> {
    if model.ir_version < MIN_IR_VERSION {
        return Err(OnnxError::UnsupportedIrVersion(model.ir_version));
    }

    if model.graph.is_none() {
        return Err(OnnxError::GraphValidation("Model has no graph".to_string()));
    }

    let opset = model.opset_version();
    if opset > crate::SUPPORTED_OPSET_VERSION {
        eprintln!("Warning: ONNX opset version {opset} may not be fully supported");
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{GraphProto, NodeProto, OperatorSetIdProto, TensorDataType, ValueInfo};

    fn minimal_model() -> ModelProto {
        ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 13,
            }],
            graph: Some(GraphProto {
                name: Some("test_graph".to_string()),
                node: vec![NodeProto::new("Relu", &["x"], &["y"])],
                input: vec![ValueInfo::tensor("x", TensorDataType::Float, &[1, 4])],
                output: vec![ValueInfo::tensor("y", TensorDataType::Float, &[1, 4])],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_model("/nonexistent/model.onnx").unwrap_err();
        assert!(matches!(err, OnnxError::ModelNotFound(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("onnxforge-model-test");
        let path = dir.join("nested").join("model.onnx");
        let model = minimal_model();

        save_model(&model, &path).unwrap();
        assert!(path.is_file());

        let loaded = load_model(&path).unwrap();
        assert_eq!(model, loaded);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_json_format() {
        let model = minimal_model();
        let json = serde_json::to_vec(&model).unwrap();
        let loaded = load_model_bytes(&json).unwrap();
        assert_eq!(loaded.opset_version(), 13);
    }

    #[test]
    fn test_validate_no_graph() {
        let model = ModelProto {
            ir_version: 8,
            ..Default::default()
        };
        let err = load_model_bytes(&prost::Message::encode_to_vec(&model)).unwrap_err();
        assert!(matches!(err, OnnxError::GraphValidation(_)));
    }

    #[test]
    fn test_validate_old_ir_version() {
        let model = ModelProto {
            ir_version: 1,
            graph: Some(GraphProto::default()),
            ..Default::default()
        };
        let err = load_model_bytes(&prost::Message::encode_to_vec(&model)).unwrap_err();
        assert!(matches!(err, OnnxError::UnsupportedIrVersion(1)));
    }
}
