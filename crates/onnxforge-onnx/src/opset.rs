//! Opset Version Upgrading
//!
//! Rewrites a model to target a newer default-domain opset version.
//! Most operators are unchanged between versions and pass through; the
//! adapters below handle the signature changes that matter in practice,
//! where attributes were promoted to inputs.
//!
//! - `Clip` (<11): `min`/`max` attributes become optional inputs
//! - `Pad` (<11): `pads`/`value` attributes become inputs
//! - `Squeeze`/`Unsqueeze` (<13): `axes` attribute becomes an input
//! - `Split` (<13): `split` attribute becomes an input
//! - `ReduceSum` (<13): `axes` attribute becomes an input
//! - `Softmax` (<13): the old default `axis=1` is made explicit
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::collections::HashSet;

use crate::error::{OnnxError, OnnxResult};
use crate::proto::{AttributeProto, GraphProto, ModelProto, TensorProto};

// =============================================================================
// Public API
// =============================================================================

/// Upgrades a model in place to the given default-domain opset version.
///
/// Upgrading from a version at or above the target is a no-op. Downgrading
/// is an error.
pub fn upgrade_opset(model: &mut ModelProto, target: i64) -> OnnxResult<()> {
    let current = model.opset_version();

    if current > target {
        return Err(OnnxError::OpsetDowngrade {
            from: current,
            to: target,
        });
    }
    if current == target {
        return Ok(());
    }

    if let Some(graph) = model.graph.as_mut() {
        upgrade_graph(graph, current);
    }
    model.set_opset_version(target);

    Ok(())
}

// =============================================================================
// Graph Upgrading
// =============================================================================

fn upgrade_graph(graph: &mut GraphProto, from_version: i64) {
    let mut used = graph.used_names();
    let mut new_initializers: Vec<TensorProto> = Vec::new();

    for node in &mut graph.node {
        match node.op_type.as_str() {
            "Clip" if from_version < 11 => {
                upgrade_clip(node, &mut used, &mut new_initializers);
            }
            "Pad" if from_version < 11 => {
                upgrade_pad(node, &mut used, &mut new_initializers);
            }
            "Squeeze" | "Unsqueeze" if from_version < 13 => {
                promote_ints_attribute(node, "axes", &mut used, &mut new_initializers);
            }
            "Split" if from_version < 13 => {
                promote_ints_attribute(node, "split", &mut used, &mut new_initializers);
            }
            "ReduceSum" if from_version < 13 => {
                promote_ints_attribute(node, "axes", &mut used, &mut new_initializers);
            }
            "Softmax" if from_version < 13 => {
                // Default axis changed from 1 to -1 at opset 13.
                if node.get_int("axis").is_none() {
                    node.attribute.push(AttributeProto::int("axis", 1));
                }
            }
            _ => {}
        }
    }

    // Recurse into control-flow subgraphs.
    for node in &mut graph.node {
        for attr in &mut node.attribute {
            if let Some(subgraph) = attr.g.as_mut() {
                upgrade_graph(subgraph, from_version);
            }
            for subgraph in &mut attr.graphs {
                upgrade_graph(subgraph, from_version);
            }
        }
    }

    graph.initializer.extend(new_initializers);
}

// =============================================================================
// Adapters
// =============================================================================

/// Moves an int-array attribute to a trailing int64 initializer input.
fn promote_ints_attribute(
    node: &mut crate::proto::NodeProto,
    attr_name: &str,
    used: &mut HashSet<String>,
    initializers: &mut Vec<TensorProto>,
) {
    let Some(attr) = node.take_attribute(attr_name) else {
        return;
    };

    let base = node.output.first().map(String::as_str).unwrap_or("anon");
    let name = unique_name(&format!("{base}_{attr_name}"), used);
    let len = attr.ints.len() as i64;
    initializers.push(TensorProto::int64(&name, &[len], attr.ints));
    node.input.push(name);
}

/// Clip <11: `min`/`max` attributes become optional scalar inputs.
fn upgrade_clip(
    node: &mut crate::proto::NodeProto,
    used: &mut HashSet<String>,
    initializers: &mut Vec<TensorProto>,
) {
    let min = node.take_attribute("min").and_then(|a| a.f);
    let max = node.take_attribute("max").and_then(|a| a.f);

    let base = node.output.first().map(String::as_str).unwrap_or("anon");

    match (min, max) {
        (None, None) => {}
        (min, max) => {
            if let Some(v) = min {
                let name = unique_name(&format!("{base}_min"), used);
                initializers.push(TensorProto::float(&name, &[], vec![v]));
                node.input.push(name);
            } else {
                // Placeholder keeps max in input position 2.
                node.input.push(String::new());
            }
            if let Some(v) = max {
                let name = unique_name(&format!("{base}_max"), used);
                initializers.push(TensorProto::float(&name, &[], vec![v]));
                node.input.push(name);
            }
        }
    }
}

/// Pad <11: `pads`/`value` attributes become inputs; `mode` stays an attribute.
fn upgrade_pad(
    node: &mut crate::proto::NodeProto,
    used: &mut HashSet<String>,
    initializers: &mut Vec<TensorProto>,
) {
    let Some(pads) = node.take_attribute("pads") else {
        return;
    };
    let value = node.take_attribute("value").and_then(|a| a.f);

    let base = node.output.first().map(String::as_str).unwrap_or("anon");

    let pads_name = unique_name(&format!("{base}_pads"), used);
    let len = pads.ints.len() as i64;
    initializers.push(TensorProto::int64(&pads_name, &[len], pads.ints));
    node.input.push(pads_name);

    if let Some(v) = value {
        let value_name = unique_name(&format!("{base}_value"), used);
        initializers.push(TensorProto::float(&value_name, &[], vec![v]));
        node.input.push(value_name);
    }
}

/// Returns `base`, or `base_1`, `base_2`, ... if taken, and records the result.
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
    use crate::proto::{NodeProto, OperatorSetIdProto};

    fn model_with_node(opset: i64, node: NodeProto) -> ModelProto {
        ModelProto {
            ir_version: 7,
            opset_import: vec![OperatorSetIdProto {
                domain: None,
                version: opset,
            }],
            graph: Some(GraphProto {
                node: vec![node],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_upgrade_is_noop_at_target() {
        let mut model = model_with_node(19, NodeProto::new("Relu", &["x"], &["y"]));
        let before = model.clone();
        upgrade_opset(&mut model, 19).unwrap();
        assert_eq!(model, before);
    }

    #[test]
    fn test_downgrade_is_error() {
        let mut model = model_with_node(19, NodeProto::new("Relu", &["x"], &["y"]));
        let err = upgrade_opset(&mut model, 13).unwrap_err();
        assert!(matches!(
            err,
            OnnxError::OpsetDowngrade { from: 19, to: 13 }
        ));
    }

    #[test]
    fn test_clip_attributes_become_inputs() {
        let mut node = NodeProto::new("Clip", &["x"], &["y"]);
        node.attribute.push(AttributeProto::float("min", 0.0));
        node.attribute.push(AttributeProto::float("max", 6.0));
        let mut model = model_with_node(9, node);

        upgrade_opset(&mut model, 19).unwrap();
        assert_eq!(model.opset_version(), 19);

        let graph = model.graph.as_ref().unwrap();
        let clip = &graph.node[0];
        assert_eq!(clip.input.len(), 3);
        assert!(clip.attribute.is_empty());
        assert_eq!(graph.initializer.len(), 2);
        assert_eq!(graph.initializer[0].get_float_data(), vec![0.0]);
        assert_eq!(graph.initializer[1].get_float_data(), vec![6.0]);
    }

    #[test]
    fn test_clip_max_only_gets_placeholder() {
        let mut node = NodeProto::new("Clip", &["x"], &["y"]);
        node.attribute.push(AttributeProto::float("max", 1.0));
        let mut model = model_with_node(9, node);

        upgrade_opset(&mut model, 19).unwrap();
        let clip = &model.graph.as_ref().unwrap().node[0];
        assert_eq!(clip.input, vec!["x", "", "y_max"]);
    }

    #[test]
    fn test_unsqueeze_axes_become_input() {
        let mut node = NodeProto::new("Unsqueeze", &["x"], &["y"]);
        node.attribute.push(AttributeProto::ints("axes", vec![0]));
        let mut model = model_with_node(11, node);

        upgrade_opset(&mut model, 19).unwrap();
        let graph = model.graph.as_ref().unwrap();
        assert_eq!(graph.node[0].input.len(), 2);
        assert_eq!(graph.initializer[0].get_int64_data(), vec![0]);
    }

    #[test]
    fn test_softmax_old_default_axis_kept() {
        let node = NodeProto::new("Softmax", &["x"], &["y"]);
        let mut model = model_with_node(11, node);

        upgrade_opset(&mut model, 19).unwrap();
        let softmax = &model.graph.as_ref().unwrap().node[0];
        assert_eq!(softmax.get_int("axis"), Some(1));
    }

    #[test]
    fn test_unrelated_op_untouched() {
        let mut node = NodeProto::new("Conv", &["x", "w"], &["y"]);
        node.attribute.push(AttributeProto::ints("strides", vec![1, 1]));
        let mut model = model_with_node(9, node);

        upgrade_opset(&mut model, 19).unwrap();
        let conv = &model.graph.as_ref().unwrap().node[0];
        assert_eq!(conv.input.len(), 2);
        assert_eq!(conv.get_ints("strides"), Some(&[1i64, 1][..]));
    }

    #[test]
    fn test_unique_name_avoids_collision() {
        let mut used: HashSet<String> = ["y_axes".to_string()].into_iter().collect();
        assert_eq!(unique_name("y_axes", &mut used), "y_axes_1");
        assert_eq!(unique_name("y_axes", &mut used), "y_axes_2");
    }
}
