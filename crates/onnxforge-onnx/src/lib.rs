//! OnnxForge ONNX - Model I/O and Graph Transformations
//!
//! Loads and saves ONNX models and provides the graph-level transformations
//! the OnnxForge pipelines are built on:
//!
//! - **Load/save**: binary protobuf via prost, JSON accepted for fixtures
//! - **Opset upgrading**: rewrite models to target a newer opset version
//! - **Preprocessing**: static shape inference plus graph cleanup
//!
//! # Example
//! ```ignore
//! use onnxforge_onnx::{load_model, save_model, upgrade_opset};
//!
//! let mut model = load_model("model.onnx")?;
//! upgrade_opset(&mut model, 19)?;
//! save_model(&model, "model_opset19.onnx")?;
//! ```
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod model;
pub mod opset;
pub mod preprocess;
pub mod proto;

pub use error::{OnnxError, OnnxResult};
pub use model::{load_model, load_model_bytes, save_model};
pub use opset::upgrade_opset;
pub use preprocess::preprocess;

// =============================================================================
// Constants
// =============================================================================

/// Highest ONNX opset version this crate knows the semantics of.
pub const SUPPORTED_OPSET_VERSION: i64 = 19;

/// Opset version the quantization pipeline upgrades models to.
pub const TARGET_OPSET_VERSION: i64 = 19;

/// Oldest ONNX IR version accepted by the loader.
pub const MIN_IR_VERSION: i64 = 3;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(TARGET_OPSET_VERSION <= SUPPORTED_OPSET_VERSION);
        assert!(MIN_IR_VERSION > 0);
    }
}
