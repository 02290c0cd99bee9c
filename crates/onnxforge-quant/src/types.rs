//! Quantization Types
//!
//! Configuration types for dynamic weight quantization and float16
//! conversion.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::fmt;

use crate::error::{QuantError, QuantResult};

// =============================================================================
// Weight Type
// =============================================================================

/// Storage type for quantized weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightType {
    /// Unsigned 8-bit with an asymmetric zero point.
    QUInt8,
    /// Signed 8-bit, zero point fixed at 0.
    QInt8,
}

impl WeightType {
    /// Parses a weight type from a string.
    pub fn parse(s: &str) -> QuantResult<Self> {
        match s.to_uppercase().as_str() {
            "QUINT8" | "UINT8" | "U8" => Ok(WeightType::QUInt8),
            "QINT8" | "INT8" | "I8" => Ok(WeightType::QInt8),
            _ => Err(QuantError::UnknownWeightType(s.to_string())),
        }
    }

    /// ONNX tensor element type for this weight type.
    pub fn elem_type(&self) -> onnxforge_onnx::proto::TensorDataType {
        match self {
            WeightType::QUInt8 => onnxforge_onnx::proto::TensorDataType::Uint8,
            WeightType::QInt8 => onnxforge_onnx::proto::TensorDataType::Int8,
        }
    }
}

impl fmt::Display for WeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightType::QUInt8 => write!(f, "QUInt8"),
            WeightType::QInt8 => write!(f, "QInt8"),
        }
    }
}

// =============================================================================
// Quantization Config
// =============================================================================

/// Operator allow-list for the default dynamic quantization pipeline.
pub const DYNAMIC_QUANT_OPS: &[&str] = &["Conv", "MatMul", "Gemm", "Add", "Mul"];

/// Operator allow-list for the per-channel quantization pipeline.
pub const PER_CHANNEL_QUANT_OPS: &[&str] = &["Conv", "MatMul", "Gemm"];

/// Configuration for dynamic weight quantization.
#[derive(Debug, Clone)]
pub struct QuantConfig {
    /// Storage type for quantized weights.
    pub weight_type: WeightType,
    /// Quantize with one scale per channel instead of per tensor.
    pub per_channel: bool,
    /// Restrict the quantized range to 7 bits for older kernels.
    pub reduce_range: bool,
    /// Operator types whose weights are quantized.
    pub op_types: Vec<String>,
    /// Use a symmetric range with zero point 0.
    pub weight_symmetric: bool,
    /// Recurse into If/Loop/Scan subgraphs.
    pub enable_subgraph: bool,
    /// Also quantize rank-1 tensors (biases, scalars stay excluded).
    pub force_quantize: bool,
}

impl QuantConfig {
    /// Defaults matching the opset-upgrade quantization pipeline:
    /// per-tensor asymmetric QUInt8 over Conv/MatMul/Gemm/Add/Mul.
    pub fn dynamic() -> Self {
        Self {
            weight_type: WeightType::QUInt8,
            per_channel: false,
            reduce_range: false,
            op_types: DYNAMIC_QUANT_OPS.iter().map(|s| (*s).to_string()).collect(),
            weight_symmetric: false,
            enable_subgraph: true,
            force_quantize: false,
        }
    }

    /// Defaults matching the preprocessing quantization pipeline:
    /// per-channel symmetric QInt8 over Conv/MatMul/Gemm.
    pub fn per_channel() -> Self {
        Self {
            weight_type: WeightType::QInt8,
            per_channel: true,
            reduce_range: false,
            op_types: PER_CHANNEL_QUANT_OPS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            weight_symmetric: true,
            enable_subgraph: true,
            force_quantize: false,
        }
    }

    /// Minimum opset version this configuration needs for DequantizeLinear.
    pub fn required_opset(&self) -> i64 {
        if self.per_channel {
            13
        } else {
            10
        }
    }
}

// =============================================================================
// Float16 Config
// =============================================================================

/// Configuration for float32 to float16 conversion.
#[derive(Debug, Clone)]
pub struct Fp16Config {
    /// Keep graph inputs/outputs at float32 and insert boundary casts.
    pub keep_io_types: bool,
}

impl Default for Fp16Config {
    fn default() -> Self {
        Self {
            keep_io_types: true,
        }
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Counters reported after weight quantization.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantSummary {
    /// Number of weight tensors quantized.
    pub quantized: usize,
    /// Number of candidate tensors skipped (wrong rank, already quantized).
    pub skipped: usize,
}

/// Counters reported after float16 conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fp16Summary {
    /// Number of float32 tensors converted.
    pub converted: usize,
    /// Number of boundary Cast nodes inserted.
    pub casts_inserted: usize,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_type_parse() {
        assert_eq!(WeightType::parse("QUInt8").unwrap(), WeightType::QUInt8);
        assert_eq!(WeightType::parse("int8").unwrap(), WeightType::QInt8);
        assert_eq!(WeightType::parse("u8").unwrap(), WeightType::QUInt8);
        assert!(matches!(
            WeightType::parse("fp4"),
            Err(QuantError::UnknownWeightType(_))
        ));
    }

    #[test]
    fn test_pipeline_defaults() {
        let dynamic = QuantConfig::dynamic();
        assert_eq!(dynamic.weight_type, WeightType::QUInt8);
        assert!(!dynamic.per_channel);
        assert!(!dynamic.weight_symmetric);
        assert!(dynamic.op_types.iter().any(|op| op == "Add"));
        assert_eq!(dynamic.required_opset(), 10);

        let per_channel = QuantConfig::per_channel();
        assert_eq!(per_channel.weight_type, WeightType::QInt8);
        assert!(per_channel.per_channel);
        assert!(per_channel.weight_symmetric);
        assert_eq!(per_channel.op_types.len(), 3);
        assert_eq!(per_channel.required_opset(), 13);
    }

    #[test]
    fn test_fp16_defaults() {
        assert!(Fp16Config::default().keep_io_types);
    }
}
