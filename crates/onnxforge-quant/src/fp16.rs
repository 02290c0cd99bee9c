//! Float16 Conversion
//!
//! Converts every float32 tensor in a model to float16: initializers,
//! attribute tensors, value-info annotations, and Cast targets. Values
//! outside the float16 range saturate to the largest (or smallest subnormal)
//! representable magnitude instead of overflowing to infinity or flushing
//! to zero. Graph inputs and outputs can be kept at float32 with boundary
//! Cast nodes so callers never see a changed signature.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::collections::HashSet;

use half::f16;
use rayon::prelude::*;

use onnxforge_onnx::proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, TensorDataType, TensorProto,
};

use crate::error::{QuantError, QuantResult};
use crate::types::{Fp16Config, Fp16Summary};

/// Largest finite float16 value.
const F16_MAX: f32 = 65504.0;
/// Smallest positive (subnormal) float16 value.
const F16_MIN_POSITIVE: f32 = 5.960_464_5e-8;

const FLOAT: i32 = TensorDataType::Float as i32;
const FLOAT16: i32 = TensorDataType::Float16 as i32;

// =============================================================================
// Public API
// =============================================================================

/// Converts a model's float32 tensors to float16 in place.
pub fn convert_to_fp16(model: &mut ModelProto, config: &Fp16Config) -> QuantResult<Fp16Summary> {
    let mut summary = Fp16Summary::default();
    let graph = model.graph.as_mut().ok_or(QuantError::MissingGraph)?;
    convert_graph(graph, config.keep_io_types, &mut summary);
    Ok(summary)
}

// =============================================================================
// Graph Conversion
// =============================================================================

fn convert_graph(graph: &mut GraphProto, keep_io_types: bool, summary: &mut Fp16Summary) {
    for init in &mut graph.initializer {
        if convert_tensor(init) {
            summary.converted += 1;
        }
    }

    for node in &mut graph.node {
        for attr in &mut node.attribute {
            if let Some(t) = attr.t.as_mut() {
                if convert_tensor(t) {
                    summary.converted += 1;
                }
            }
            for t in &mut attr.tensors {
                if convert_tensor(t) {
                    summary.converted += 1;
                }
            }
            // Subgraph boundaries are internal, so io types always follow.
            if let Some(subgraph) = attr.g.as_mut() {
                convert_graph(subgraph, false, summary);
            }
            for subgraph in &mut attr.graphs {
                convert_graph(subgraph, false, summary);
            }
        }
        if node.op_type == "Cast" {
            retarget_cast(node);
        }
    }

    for vi in &mut graph.value_info {
        flip_value_info(vi);
    }

    if keep_io_types {
        insert_boundary_casts(graph, summary);
    } else {
        for vi in &mut graph.input {
            flip_value_info(vi);
        }
        for vi in &mut graph.output {
            flip_value_info(vi);
        }
    }
}

/// Rewrites `Cast(to=float)` to `Cast(to=float16)` so casts introduced for
/// earlier mixed-precision regions collapse into the converted graph.
fn retarget_cast(node: &mut NodeProto) {
    for attr in &mut node.attribute {
        if attr.name == "to" && attr.i == Some(FLOAT as i64) {
            attr.i = Some(FLOAT16 as i64);
        }
    }
}

fn flip_value_info(vi: &mut onnxforge_onnx::proto::ValueInfo) {
    if vi.elem_type() == Some(FLOAT) {
        if let Some(t) = vi.r#type.as_mut() {
            if let Some(tensor) = t.tensor_type.as_mut() {
                tensor.elem_type = FLOAT16;
            }
        }
    }
}

/// Keeps float32 graph inputs and outputs by casting at the boundary.
///
/// Inputs stay float32 and a `Cast(to=float16)` feeds the converted body;
/// outputs are produced as float16 under a renamed edge and a
/// `Cast(to=float)` restores the declared output.
fn insert_boundary_casts(graph: &mut GraphProto, summary: &mut Fp16Summary) {
    let mut used = graph.used_names();

    let float_inputs: Vec<String> = graph
        .input
        .iter()
        .filter(|vi| vi.elem_type() == Some(FLOAT))
        .map(|vi| vi.name.clone())
        .collect();

    let mut front_casts = Vec::new();
    for name in float_inputs {
        let fp16_name = unique_name(&format!("{name}_fp16"), &mut used);
        let mut rewired = false;
        for node in &mut graph.node {
            for input in &mut node.input {
                if *input == name {
                    *input = fp16_name.clone();
                    rewired = true;
                }
            }
        }
        if !rewired {
            continue;
        }
        let mut cast = NodeProto::new("Cast", &[&name], &[&fp16_name]);
        cast.attribute.push(AttributeProto::int("to", FLOAT16 as i64));
        front_casts.push(cast);
        summary.casts_inserted += 1;
    }

    let float_outputs: Vec<String> = graph
        .output
        .iter()
        .filter(|vi| vi.elem_type() == Some(FLOAT))
        .map(|vi| vi.name.clone())
        .collect();

    for name in float_outputs {
        let fp16_name = unique_name(&format!("{name}_fp16"), &mut used);
        let mut produced = false;
        for node in &mut graph.node {
            for output in &mut node.output {
                if *output == name {
                    *output = fp16_name.clone();
                    produced = true;
                }
            }
        }
        if !produced {
            continue;
        }
        // Other consumers of the renamed edge follow the producer.
        for node in &mut graph.node {
            for input in &mut node.input {
                if *input == name {
                    *input = fp16_name.clone();
                }
            }
        }
        let mut cast = NodeProto::new("Cast", &[&fp16_name], &[&name]);
        cast.attribute.push(AttributeProto::int("to", FLOAT as i64));
        graph.node.push(cast);
        summary.casts_inserted += 1;
    }

    if !front_casts.is_empty() {
        front_casts.append(&mut graph.node);
        graph.node = front_casts;
    }
}

// =============================================================================
// Tensor Conversion
// =============================================================================

/// Converts a float32 tensor to float16 raw data. Returns false if the
/// tensor holds any other element type.
fn convert_tensor(tensor: &mut TensorProto) -> bool {
    if tensor.data_type != FLOAT {
        return false;
    }
    let data = tensor.get_float_data();
    let halves: Vec<f16> = data.par_iter().map(|&v| saturate_to_f16(v)).collect();

    let mut raw = Vec::with_capacity(halves.len() * 2);
    for h in halves {
        raw.extend_from_slice(&h.to_le_bytes());
    }
    tensor.raw_data = raw;
    tensor.float_data.clear();
    tensor.data_type = FLOAT16;
    true
}

/// Converts a float32 value to float16, saturating out-of-range magnitudes
/// to the float16 limits instead of producing infinities or flushing small
/// values to zero.
fn saturate_to_f16(v: f32) -> f16 {
    if v.is_nan() || v.is_infinite() {
        return f16::from_f32(v);
    }
    let magnitude = v.abs();
    if magnitude > F16_MAX {
        return f16::from_f32(F16_MAX.copysign(v));
    }
    if magnitude > 0.0 && magnitude < F16_MIN_POSITIVE {
        return f16::from_f32(F16_MIN_POSITIVE.copysign(v));
    }
    f16::from_f32(v)
}

fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    let mut counter = 1;
    while used.contains(&name) {
        name = format!("{base}_{counter}");
        counter += 1;
    }
    used.insert(name.clone());
    name
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use onnxforge_onnx::proto::{OperatorSetIdProto, ValueInfo};

    fn relu_model() -> ModelProto {
        ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 19,
            }],
            graph: Some(GraphProto {
                node: vec![
                    NodeProto::new("Add", &["x", "w"], &["h"]),
                    NodeProto::new("Relu", &["h"], &["y"]),
                ],
                initializer: vec![TensorProto::float("w", &[2], vec![1.5, -2.5])],
                input: vec![ValueInfo::tensor("x", TensorDataType::Float, &[2])],
                output: vec![ValueInfo::tensor("y", TensorDataType::Float, &[2])],
                value_info: vec![ValueInfo::tensor("h", TensorDataType::Float, &[2])],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_initializer_converted() {
        let mut model = relu_model();
        let summary = convert_to_fp16(&mut model, &Fp16Config::default()).unwrap();
        assert_eq!(summary.converted, 1);

        let w = model.graph.as_ref().unwrap().get_initializer("w").unwrap();
        assert_eq!(w.data_type, FLOAT16);
        assert_eq!(w.raw_data.len(), 4);
        assert!(w.float_data.is_empty());

        let first = f16::from_le_bytes([w.raw_data[0], w.raw_data[1]]);
        assert_eq!(first.to_f32(), 1.5);
    }

    #[test]
    fn test_keep_io_types_inserts_casts() {
        let mut model = relu_model();
        let summary = convert_to_fp16(&mut model, &Fp16Config::default()).unwrap();
        assert_eq!(summary.casts_inserted, 2);

        let graph = model.graph.as_ref().unwrap();
        // Signature unchanged.
        assert_eq!(graph.input[0].elem_type(), Some(FLOAT));
        assert_eq!(graph.output[0].elem_type(), Some(FLOAT));

        // Cast in front, Cast at the back.
        assert_eq!(graph.node.first().map(|n| n.op_type.as_str()), Some("Cast"));
        assert_eq!(graph.node.first().and_then(|n| n.get_int("to")), Some(FLOAT16 as i64));
        assert_eq!(graph.node.last().map(|n| n.op_type.as_str()), Some("Cast"));
        assert_eq!(graph.node.last().and_then(|n| n.get_int("to")), Some(FLOAT as i64));

        // Body rewired through the cast edges.
        assert_eq!(graph.node[1].input[0], "x_fp16");
        assert_eq!(graph.node[2].output[0], "y_fp16");
    }

    #[test]
    fn test_io_types_flipped_when_not_kept() {
        let mut model = relu_model();
        let config = Fp16Config {
            keep_io_types: false,
        };
        let summary = convert_to_fp16(&mut model, &config).unwrap();
        assert_eq!(summary.casts_inserted, 0);

        let graph = model.graph.as_ref().unwrap();
        assert_eq!(graph.input[0].elem_type(), Some(FLOAT16));
        assert_eq!(graph.output[0].elem_type(), Some(FLOAT16));
        assert_eq!(graph.value_info[0].elem_type(), Some(FLOAT16));
        assert_eq!(graph.node.len(), 2);
    }

    #[test]
    fn test_existing_cast_retargeted() {
        let mut model = relu_model();
        {
            let graph = model.graph.as_mut().unwrap();
            let mut cast = NodeProto::new("Cast", &["h"], &["h32"]);
            cast.attribute.push(AttributeProto::int("to", FLOAT as i64));
            graph.node.push(cast);
        }
        convert_to_fp16(&mut model, &Fp16Config::default()).unwrap();

        let graph = model.graph.as_ref().unwrap();
        let cast = graph
            .node
            .iter()
            .find(|n| n.op_type == "Cast" && n.input[0] == "h")
            .unwrap();
        assert_eq!(cast.get_int("to"), Some(FLOAT16 as i64));
    }

    #[test]
    fn test_non_float_initializer_untouched() {
        let mut model = relu_model();
        {
            let graph = model.graph.as_mut().unwrap();
            graph
                .initializer
                .push(TensorProto::int64("axes", &[1], vec![0]));
        }
        let summary = convert_to_fp16(&mut model, &Fp16Config::default()).unwrap();
        assert_eq!(summary.converted, 1);

        let axes = model
            .graph
            .as_ref()
            .unwrap()
            .get_initializer("axes")
            .unwrap();
        assert_eq!(axes.data_type, TensorDataType::Int64 as i32);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(saturate_to_f16(1e10).to_f32(), F16_MAX);
        assert_eq!(saturate_to_f16(-1e10).to_f32(), -F16_MAX);
        assert!(saturate_to_f16(1e-12).to_f32() > 0.0);
        assert!(saturate_to_f16(-1e-12).to_f32() < 0.0);
        assert_eq!(saturate_to_f16(0.0).to_f32(), 0.0);
        assert_eq!(saturate_to_f16(1.0).to_f32(), 1.0);
        assert!(saturate_to_f16(f32::NAN).is_nan());
        assert_eq!(saturate_to_f16(f32::INFINITY), f16::INFINITY);
    }

    #[test]
    fn test_subgraph_converted() {
        let inner = GraphProto {
            node: vec![NodeProto::new("Relu", &["ix"], &["iy"])],
            initializer: vec![TensorProto::float("iw", &[1], vec![3.0])],
            input: vec![ValueInfo::tensor("ix", TensorDataType::Float, &[1])],
            output: vec![ValueInfo::tensor("iy", TensorDataType::Float, &[1])],
            ..Default::default()
        };

        let mut if_node = NodeProto::new("If", &["cond"], &["y"]);
        let mut attr = AttributeProto::int("then_branch", 0);
        attr.r#type = 5;
        attr.i = None;
        attr.g = Some(Box::new(inner));
        if_node.attribute = vec![attr];

        let mut model = ModelProto {
            ir_version: 8,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: 19,
            }],
            graph: Some(GraphProto {
                node: vec![if_node],
                ..Default::default()
            }),
            ..Default::default()
        };

        convert_to_fp16(&mut model, &Fp16Config::default()).unwrap();

        let graph = model.graph.as_ref().unwrap();
        let sub = graph.node[0].attribute[0].g.as_ref().unwrap();
        assert_eq!(sub.initializer[0].data_type, FLOAT16);
        // Subgraph boundaries always follow the converted precision.
        assert_eq!(sub.input[0].elem_type(), Some(FLOAT16));
    }
}
