//! ONNX Protocol Buffer Definitions
//!
//! Rust implementations of the ONNX protobuf structures. Field tags match
//! the official onnx.proto so models decode and encode with prost directly.
//! The structures also carry serde derives so models can round-trip through
//! JSON for inspection and tests.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Data Types
// =============================================================================

/// ONNX tensor element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TensorDataType {
    /// Undefined type.
    Undefined = 0,
    /// 32-bit float.
    Float = 1,
    /// 8-bit unsigned int.
    Uint8 = 2,
    /// 8-bit signed int.
    Int8 = 3,
    /// 16-bit unsigned int.
    Uint16 = 4,
    /// 16-bit signed int.
    Int16 = 5,
    /// 32-bit signed int.
    Int32 = 6,
    /// 64-bit signed int.
    Int64 = 7,
    /// String type.
    String = 8,
    /// Boolean type.
    Bool = 9,
    /// 16-bit float (half precision).
    Float16 = 10,
    /// 64-bit float (double).
    Double = 11,
    /// 32-bit unsigned int.
    Uint32 = 12,
    /// 64-bit unsigned int.
    Uint64 = 13,
    /// Complex 64-bit float.
    Complex64 = 14,
    /// Complex 128-bit float.
    Complex128 = 15,
    /// BFloat16.
    Bfloat16 = 16,
}

impl TensorDataType {
    /// Returns the size in bytes for this data type.
    pub fn size_bytes(&self) -> usize {
        match self {
            TensorDataType::Undefined | TensorDataType::String => 0,
            TensorDataType::Bool | TensorDataType::Int8 | TensorDataType::Uint8 => 1,
            TensorDataType::Float16
            | TensorDataType::Bfloat16
            | TensorDataType::Int16
            | TensorDataType::Uint16 => 2,
            TensorDataType::Float | TensorDataType::Int32 | TensorDataType::Uint32 => 4,
            TensorDataType::Double
            | TensorDataType::Int64
            | TensorDataType::Uint64
            | TensorDataType::Complex64 => 8,
            TensorDataType::Complex128 => 16,
        }
    }

    /// Creates from the raw i32 stored in a proto field.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(TensorDataType::Undefined),
            1 => Some(TensorDataType::Float),
            2 => Some(TensorDataType::Uint8),
            3 => Some(TensorDataType::Int8),
            4 => Some(TensorDataType::Uint16),
            5 => Some(TensorDataType::Int16),
            6 => Some(TensorDataType::Int32),
            7 => Some(TensorDataType::Int64),
            8 => Some(TensorDataType::String),
            9 => Some(TensorDataType::Bool),
            10 => Some(TensorDataType::Float16),
            11 => Some(TensorDataType::Double),
            12 => Some(TensorDataType::Uint32),
            13 => Some(TensorDataType::Uint64),
            14 => Some(TensorDataType::Complex64),
            15 => Some(TensorDataType::Complex128),
            16 => Some(TensorDataType::Bfloat16),
            _ => None,
        }
    }
}

/// Attribute type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AttributeType {
    /// Undefined attribute.
    Undefined = 0,
    /// Float value.
    Float = 1,
    /// Integer value.
    Int = 2,
    /// String value.
    String = 3,
    /// Tensor value.
    Tensor = 4,
    /// Graph value.
    Graph = 5,
    /// Float array.
    Floats = 6,
    /// Integer array.
    Ints = 7,
    /// String array.
    Strings = 8,
    /// Tensor array.
    Tensors = 9,
    /// Graph array.
    Graphs = 10,
}

// =============================================================================
// Tensor Shape
// =============================================================================

/// A dimension in a tensor shape. Either a fixed value or a symbolic name.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    /// Fixed dimension value (if known).
    #[prost(int64, optional, tag = "1")]
    pub dim_value: Option<i64>,
    /// Symbolic dimension name (if dynamic).
    #[prost(string, optional, tag = "2")]
    pub dim_param: Option<String>,
}

impl Dimension {
    /// Creates a fixed dimension.
    pub fn fixed(value: i64) -> Self {
        Self {
            dim_value: Some(value),
            dim_param: None,
        }
    }

    /// Creates a dynamic dimension with a symbolic name.
    pub fn dynamic(name: &str) -> Self {
        Self {
            dim_value: None,
            dim_param: Some(name.to_string()),
        }
    }

    /// Returns the dimension value if it's fixed.
    pub fn value(&self) -> Option<i64> {
        self.dim_value
    }
}

/// Tensor shape information.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorShape {
    /// Dimensions of the tensor.
    #[prost(message, repeated, tag = "1")]
    pub dims: Vec<Dimension>,
}

impl TensorShape {
    /// Creates a new tensor shape from fixed dimensions.
    pub fn from_dims(dims: &[i64]) -> Self {
        Self {
            dims: dims.iter().map(|&d| Dimension::fixed(d)).collect(),
        }
    }

    /// Returns the shape as fixed dimensions, or None if any is symbolic.
    pub fn static_dims(&self) -> Option<Vec<i64>> {
        self.dims.iter().map(Dimension::value).collect()
    }
}

// =============================================================================
// Type Information
// =============================================================================

/// Tensor type information.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorType {
    /// Element data type.
    #[prost(int32, tag = "1")]
    pub elem_type: i32,
    /// Shape information.
    #[prost(message, optional, tag = "2")]
    pub shape: Option<TensorShape>,
}

/// Type information for a value.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeProto {
    /// Tensor type.
    #[prost(message, optional, tag = "1")]
    pub tensor_type: Option<TensorType>,
}

// =============================================================================
// Value Information
// =============================================================================

/// Information about a graph input, output, or intermediate value.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueInfo {
    /// Name of the value.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Type information.
    #[prost(message, optional, tag = "2")]
    pub r#type: Option<TypeProto>,
    /// Documentation string.
    #[prost(string, optional, tag = "3")]
    pub doc_string: Option<String>,
}

impl ValueInfo {
    /// Creates value info for a tensor with the given element type and shape.
    pub fn tensor(name: &str, elem_type: TensorDataType, dims: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            r#type: Some(TypeProto {
                tensor_type: Some(TensorType {
                    elem_type: elem_type as i32,
                    shape: Some(TensorShape::from_dims(dims)),
                }),
            }),
            doc_string: None,
        }
    }

    /// Returns the element type, if this is a tensor value.
    pub fn elem_type(&self) -> Option<i32> {
        self.r#type
            .as_ref()
            .and_then(|t| t.tensor_type.as_ref())
            .map(|t| t.elem_type)
    }

    /// Returns the fully static shape, if known.
    pub fn static_shape(&self) -> Option<Vec<i64>> {
        self.r#type
            .as_ref()
            .and_then(|t| t.tensor_type.as_ref())
            .and_then(|t| t.shape.as_ref())
            .and_then(TensorShape::static_dims)
    }
}

// =============================================================================
// Tensor (Initializer)
// =============================================================================

/// A tensor constant (initializer/weight).
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorProto {
    /// Dimensions (shape).
    #[prost(int64, repeated, tag = "1")]
    pub dims: Vec<i64>,
    /// Data type.
    #[prost(int32, tag = "2")]
    pub data_type: i32,
    /// Float data (if not using raw_data).
    #[prost(float, repeated, tag = "4")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub float_data: Vec<f32>,
    /// Int32 data. Also holds uint8/int8/bool values.
    #[prost(int32, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub int32_data: Vec<i32>,
    /// String data.
    #[prost(bytes = "vec", repeated, tag = "6")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub string_data: Vec<Vec<u8>>,
    /// Int64 data.
    #[prost(int64, repeated, tag = "7")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub int64_data: Vec<i64>,
    /// Name of the tensor.
    #[prost(string, tag = "8")]
    pub name: String,
    /// Raw little-endian data bytes.
    #[prost(bytes = "vec", tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_data: Vec<u8>,
    /// Double data.
    #[prost(double, repeated, tag = "10")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub double_data: Vec<f64>,
    /// Uint64 data. Also holds uint32 values.
    #[prost(uint64, repeated, tag = "11")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uint64_data: Vec<u64>,
    /// Documentation string.
    #[prost(string, optional, tag = "12")]
    pub doc_string: Option<String>,
}

impl TensorProto {
    /// Creates a new float tensor.
    pub fn float(name: &str, dims: &[i64], data: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: TensorDataType::Float as i32,
            float_data: data,
            ..Default::default()
        }
    }

    /// Creates a new int64 tensor.
    pub fn int64(name: &str, dims: &[i64], data: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: TensorDataType::Int64 as i32,
            int64_data: data,
            ..Default::default()
        }
    }

    /// Creates a new tensor with 8-bit values stored as raw bytes.
    pub fn bytes(name: &str, dims: &[i64], data_type: TensorDataType, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: data_type as i32,
            raw_data: data,
            ..Default::default()
        }
    }

    /// Returns the number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().map(|&d| d.max(0) as usize).product()
    }

    /// Returns true if this tensor holds 32-bit floats.
    pub fn is_float(&self) -> bool {
        self.data_type == TensorDataType::Float as i32
    }

    /// Extracts float data from either the typed field or raw bytes.
    pub fn get_float_data(&self) -> Vec<f32> {
        if !self.float_data.is_empty() {
            return self.float_data.clone();
        }

        if !self.raw_data.is_empty() {
            return self
                .raw_data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
        }

        Vec::new()
    }

    /// Extracts int64 data from either the typed field or raw bytes.
    pub fn get_int64_data(&self) -> Vec<i64> {
        if !self.int64_data.is_empty() {
            return self.int64_data.clone();
        }

        if !self.raw_data.is_empty() {
            return self
                .raw_data
                .chunks_exact(8)
                .map(|c| {
                    i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
                })
                .collect();
        }

        Vec::new()
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// An attribute of an ONNX operator.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeProto {
    /// Attribute name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Float value.
    #[prost(float, optional, tag = "2")]
    pub f: Option<f32>,
    /// Integer value.
    #[prost(int64, optional, tag = "3")]
    pub i: Option<i64>,
    /// String value.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub s: Option<Vec<u8>>,
    /// Tensor value.
    #[prost(message, optional, tag = "5")]
    pub t: Option<TensorProto>,
    /// Graph value (subgraph of control-flow operators).
    #[prost(message, optional, boxed, tag = "6")]
    pub g: Option<Box<GraphProto>>,
    /// Float array.
    #[prost(float, repeated, tag = "7")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub floats: Vec<f32>,
    /// Integer array.
    #[prost(int64, repeated, tag = "8")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ints: Vec<i64>,
    /// String array.
    #[prost(bytes = "vec", repeated, tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strings: Vec<Vec<u8>>,
    /// Tensor array.
    #[prost(message, repeated, tag = "10")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tensors: Vec<TensorProto>,
    /// Graph array.
    #[prost(message, repeated, tag = "11")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub graphs: Vec<GraphProto>,
    /// Documentation string.
    #[prost(string, optional, tag = "13")]
    pub doc_string: Option<String>,
    /// Attribute type.
    #[prost(int32, tag = "20")]
    pub r#type: i32,
}

impl AttributeProto {
    /// Creates an integer attribute.
    pub fn int(name: &str, value: i64) -> Self {
        Self {
            name: name.to_string(),
            r#type: AttributeType::Int as i32,
            i: Some(value),
            ..Default::default()
        }
    }

    /// Creates a float attribute.
    pub fn float(name: &str, value: f32) -> Self {
        Self {
            name: name.to_string(),
            r#type: AttributeType::Float as i32,
            f: Some(value),
            ..Default::default()
        }
    }

    /// Creates an integer array attribute.
    pub fn ints(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            r#type: AttributeType::Ints as i32,
            ints: values,
            ..Default::default()
        }
    }

    /// Creates a tensor attribute.
    pub fn tensor(name: &str, value: TensorProto) -> Self {
        Self {
            name: name.to_string(),
            r#type: AttributeType::Tensor as i32,
            t: Some(value),
            ..Default::default()
        }
    }

    /// Gets the string value.
    pub fn get_string(&self) -> Option<String> {
        self.s
            .as_ref()
            .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
    }
}

// =============================================================================
// Node (Operator)
// =============================================================================

/// A node in the ONNX computation graph (operator).
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeProto {
    /// Input tensor names. An empty string marks an omitted optional input.
    #[prost(string, repeated, tag = "1")]
    pub input: Vec<String>,
    /// Output tensor names.
    #[prost(string, repeated, tag = "2")]
    pub output: Vec<String>,
    /// Node name (optional, for debugging).
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
    /// Operator type (e.g., "Conv", "Relu", "MatMul").
    #[prost(string, tag = "4")]
    pub op_type: String,
    /// Operator attributes.
    #[prost(message, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeProto>,
    /// Documentation string.
    #[prost(string, optional, tag = "6")]
    pub doc_string: Option<String>,
    /// ONNX domain (empty for default ONNX ops).
    #[prost(string, optional, tag = "7")]
    pub domain: Option<String>,
}

impl NodeProto {
    /// Creates a node with the given operator, inputs, and outputs.
    pub fn new(op_type: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            input: inputs.iter().map(|s| (*s).to_string()).collect(),
            output: outputs.iter().map(|s| (*s).to_string()).collect(),
            op_type: op_type.to_string(),
            ..Default::default()
        }
    }

    /// Gets an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeProto> {
        self.attribute.iter().find(|a| a.name == name)
    }

    /// Gets an integer attribute by name.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get_attribute(name).and_then(|a| a.i)
    }

    /// Gets a float attribute by name.
    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.get_attribute(name).and_then(|a| a.f)
    }

    /// Gets an integer array attribute by name.
    pub fn get_ints(&self, name: &str) -> Option<&[i64]> {
        self.get_attribute(name).map(|a| a.ints.as_slice())
    }

    /// Removes an attribute by name, returning it if present.
    pub fn take_attribute(&mut self, name: &str) -> Option<AttributeProto> {
        let idx = self.attribute.iter().position(|a| a.name == name)?;
        Some(self.attribute.remove(idx))
    }
}

// =============================================================================
// Graph
// =============================================================================

/// An ONNX computation graph.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphProto {
    /// Nodes (operators) in topological order.
    #[prost(message, repeated, tag = "1")]
    pub node: Vec<NodeProto>,
    /// Graph name.
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
    /// Initializers (weights/constants).
    #[prost(message, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub initializer: Vec<TensorProto>,
    /// Documentation string.
    #[prost(string, optional, tag = "10")]
    pub doc_string: Option<String>,
    /// Graph inputs.
    #[prost(message, repeated, tag = "11")]
    pub input: Vec<ValueInfo>,
    /// Graph outputs.
    #[prost(message, repeated, tag = "12")]
    pub output: Vec<ValueInfo>,
    /// Intermediate value information.
    #[prost(message, repeated, tag = "13")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_info: Vec<ValueInfo>,
}

impl GraphProto {
    /// Gets an initializer by name.
    pub fn get_initializer(&self, name: &str) -> Option<&TensorProto> {
        self.initializer.iter().find(|i| i.name == name)
    }

    /// Returns a map of initializer name to its index in the initializer list.
    pub fn initializer_index(&self) -> HashMap<String, usize> {
        self.initializer
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect()
    }

    /// Returns the set of every tensor name used in the graph.
    pub fn used_names(&self) -> std::collections::HashSet<String> {
        let mut names = std::collections::HashSet::new();
        for node in &self.node {
            names.extend(node.input.iter().cloned());
            names.extend(node.output.iter().cloned());
        }
        names.extend(self.initializer.iter().map(|t| t.name.clone()));
        names.extend(self.input.iter().map(|v| v.name.clone()));
        names.extend(self.output.iter().map(|v| v.name.clone()));
        names
    }
}

// =============================================================================
// Opset Import
// =============================================================================

/// Opset import declaration.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSetIdProto {
    /// Domain (empty for default ONNX ops).
    #[prost(string, optional, tag = "1")]
    pub domain: Option<String>,
    /// Opset version.
    #[prost(int64, tag = "2")]
    pub version: i64,
}

// =============================================================================
// Model
// =============================================================================

/// String-string key-value pair.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct StringStringEntry {
    /// Key.
    #[prost(string, tag = "1")]
    pub key: String,
    /// Value.
    #[prost(string, tag = "2")]
    pub value: String,
}

/// An ONNX model.
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProto {
    /// ONNX IR version.
    #[prost(int64, tag = "1")]
    pub ir_version: i64,
    /// Producer name.
    #[prost(string, optional, tag = "2")]
    pub producer_name: Option<String>,
    /// Producer version.
    #[prost(string, optional, tag = "3")]
    pub producer_version: Option<String>,
    /// Domain.
    #[prost(string, optional, tag = "4")]
    pub domain: Option<String>,
    /// Model version.
    #[prost(int64, optional, tag = "5")]
    pub model_version: Option<i64>,
    /// Documentation string.
    #[prost(string, optional, tag = "6")]
    pub doc_string: Option<String>,
    /// The computation graph.
    #[prost(message, optional, tag = "7")]
    pub graph: Option<GraphProto>,
    /// Opset imports.
    #[prost(message, repeated, tag = "8")]
    pub opset_import: Vec<OperatorSetIdProto>,
    /// Metadata properties.
    #[prost(message, repeated, tag = "14")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata_props: Vec<StringStringEntry>,
}

impl ModelProto {
    /// Gets the default-domain opset version.
    pub fn opset_version(&self) -> i64 {
        self.opset_import
            .iter()
            .find(|o| o.domain.is_none() || o.domain.as_deref() == Some(""))
            .map(|o| o.version)
            .unwrap_or(0)
    }

    /// Sets the default-domain opset version, adding the entry if missing.
    pub fn set_opset_version(&mut self, version: i64) {
        for opset in &mut self.opset_import {
            if opset.domain.is_none() || opset.domain.as_deref() == Some("") {
                opset.version = version;
                return;
            }
        }
        self.opset_import.push(OperatorSetIdProto {
            domain: None,
            version,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_tensor_data_type() {
        assert_eq!(TensorDataType::Float.size_bytes(), 4);
        assert_eq!(TensorDataType::Float16.size_bytes(), 2);
        assert_eq!(TensorDataType::Uint8.size_bytes(), 1);
        assert_eq!(TensorDataType::from_i32(1), Some(TensorDataType::Float));
        assert_eq!(TensorDataType::from_i32(10), Some(TensorDataType::Float16));
        assert_eq!(TensorDataType::from_i32(99), None);
    }

    #[test]
    fn test_tensor_proto_float() {
        let tensor = TensorProto::float("weight", &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(tensor.numel(), 6);
        assert!(tensor.is_float());
        assert_eq!(tensor.get_float_data().len(), 6);
    }

    #[test]
    fn test_tensor_proto_raw_data() {
        let mut raw = Vec::new();
        for v in [1.5f32, -2.5] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let tensor = TensorProto {
            name: "w".to_string(),
            dims: vec![2],
            data_type: TensorDataType::Float as i32,
            raw_data: raw,
            ..Default::default()
        };
        assert_eq!(tensor.get_float_data(), vec![1.5, -2.5]);
    }

    #[test]
    fn test_attribute_proto() {
        let attr = AttributeProto::int("axis", 3);
        assert_eq!(attr.i, Some(3));
        assert_eq!(attr.r#type, AttributeType::Int as i32);

        let attr = AttributeProto::ints("pads", vec![1, 1, 1, 1]);
        assert_eq!(attr.ints.len(), 4);
    }

    #[test]
    fn test_node_attribute_lookup() {
        let mut node = NodeProto::new("Conv", &["x", "w"], &["y"]);
        node.attribute.push(AttributeProto::ints("strides", vec![2, 2]));
        assert_eq!(node.get_ints("strides"), Some(&[2i64, 2][..]));
        assert_eq!(node.get_int("group"), None);

        let taken = node.take_attribute("strides").unwrap();
        assert_eq!(taken.ints, vec![2, 2]);
        assert!(node.get_attribute("strides").is_none());
    }

    #[test]
    fn test_opset_version_helpers() {
        let mut model = ModelProto {
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 13,
            }],
            ..Default::default()
        };
        assert_eq!(model.opset_version(), 13);

        model.set_opset_version(19);
        assert_eq!(model.opset_version(), 19);
        assert_eq!(model.opset_import.len(), 1);
    }

    #[test]
    fn test_proto_roundtrip() {
        let model = ModelProto {
            ir_version: 8,
            producer_name: Some("onnxforge".to_string()),
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 19,
            }],
            graph: Some(GraphProto {
                name: Some("g".to_string()),
                node: vec![NodeProto::new("Relu", &["x"], &["y"])],
                initializer: vec![TensorProto::float("w", &[2], vec![0.5, -0.5])],
                input: vec![ValueInfo::tensor("x", TensorDataType::Float, &[1, 2])],
                output: vec![ValueInfo::tensor("y", TensorDataType::Float, &[1, 2])],
                ..Default::default()
            }),
            ..Default::default()
        };

        let bytes = model.encode_to_vec();
        let decoded = ModelProto::decode(bytes.as_slice()).unwrap();
        assert_eq!(model, decoded);
    }
}
