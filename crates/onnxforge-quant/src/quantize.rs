//! Dynamic Weight Quantization
//!
//! Rewrites a graph so float32 weights of allow-listed operators are stored
//! as 8-bit initializers. Each quantized weight gets scale and zero-point
//! initializers and a `DequantizeLinear` node feeding the original consumer,
//! so the graph stays valid for any ONNX runtime while the file shrinks to
//! roughly a quarter of the weight payload.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use onnxforge_onnx::proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, TensorProto,
};

use crate::error::{QuantError, QuantResult};
use crate::types::{QuantConfig, QuantSummary, WeightType};

// =============================================================================
// Public API
// =============================================================================

/// Quantizes the weights of a model in place.
///
/// # Example
/// ```ignore
/// use onnxforge_quant::{quantize_model_weights, QuantConfig};
///
/// let summary = quantize_model_weights(&mut model, &QuantConfig::dynamic())?;
/// println!("quantized {} weight tensors", summary.quantized);
/// ```
pub fn quantize_model_weights(
    model: &mut ModelProto,
    config: &QuantConfig,
) -> QuantResult<QuantSummary> {
    let opset = model.opset_version();
    let required = config.required_opset();
    if opset < required {
        return Err(QuantError::OpsetTooOld {
            found: opset,
            required,
            mode: if config.per_channel {
                "per-channel"
            } else {
                "per-tensor"
            },
        });
    }

    let graph = model.graph.as_mut().ok_or(QuantError::MissingGraph)?;
    quantize_graph(graph, config)
}

// =============================================================================
// Graph Rewrite
// =============================================================================

/// A weight selected for quantization and the node inputs that consume it.
struct WeightPlan {
    init_idx: usize,
    axis: usize,
    consumers: Vec<(usize, usize)>,
}

/// Quantizes the weights of a single graph, recursing into subgraphs when
/// the configuration asks for it.
fn quantize_graph(graph: &mut GraphProto, config: &QuantConfig) -> QuantResult<QuantSummary> {
    let mut summary = QuantSummary::default();

    let plans = plan_weights(graph, config, &mut summary);

    let mut used = graph.used_names();
    let mut new_nodes: Vec<NodeProto> = Vec::new();
    let mut new_initializers: Vec<TensorProto> = Vec::new();
    let mut rewires: Vec<(usize, usize, String)> = Vec::new();
    let mut replaced: HashSet<usize> = HashSet::new();

    for (weight_name, plan) in &plans {
        let init = &graph.initializer[plan.init_idx];
        let data = init.get_float_data();
        let expected = init.numel();
        if expected == 0 {
            summary.skipped += 1;
            continue;
        }
        // A decodable model can still declare more elements than it carries.
        if data.len() != expected {
            return Err(QuantError::DataLengthMismatch {
                name: weight_name.clone(),
                expected,
                actual: data.len(),
            });
        }

        let dims = init.dims.clone();
        let quantized = quantize_tensor_data(&data, &dims, plan.axis, config)?;

        let q_name = unique_name(&format!("{weight_name}_quantized"), &mut used);
        let scale_name = unique_name(&format!("{weight_name}_scale"), &mut used);
        let zp_name = unique_name(&format!("{weight_name}_zero_point"), &mut used);
        let dq_name = unique_name(&format!("{weight_name}_dequantized"), &mut used);

        let param_dims: &[i64] = if config.per_channel {
            &dims[plan.axis..=plan.axis]
        } else {
            &[]
        };

        new_initializers.push(TensorProto::bytes(
            &q_name,
            &dims,
            config.weight_type.elem_type(),
            quantized.values,
        ));
        new_initializers.push(TensorProto::float(&scale_name, param_dims, quantized.scales));
        new_initializers.push(TensorProto::bytes(
            &zp_name,
            param_dims,
            config.weight_type.elem_type(),
            quantized.zero_points,
        ));

        let mut dequant = NodeProto::new(
            "DequantizeLinear",
            &[&q_name, &scale_name, &zp_name],
            &[&dq_name],
        );
        if config.per_channel {
            dequant
                .attribute
                .push(AttributeProto::int("axis", plan.axis as i64));
        }
        new_nodes.push(dequant);

        for &(node_idx, input_idx) in &plan.consumers {
            rewires.push((node_idx, input_idx, dq_name.clone()));
        }
        replaced.insert(plan.init_idx);
        summary.quantized += 1;
    }

    for (node_idx, input_idx, name) in rewires {
        graph.node[node_idx].input[input_idx] = name;
    }

    if !replaced.is_empty() {
        let mut kept = Vec::with_capacity(graph.initializer.len());
        for (idx, init) in graph.initializer.drain(..).enumerate() {
            if !replaced.contains(&idx) {
                kept.push(init);
            }
        }
        graph.initializer = kept;
    }
    graph.initializer.extend(new_initializers);

    // Dequantize nodes only read initializers, so the front of the node
    // list keeps the graph topologically sorted.
    if !new_nodes.is_empty() {
        new_nodes.append(&mut graph.node);
        graph.node = new_nodes;
    }

    if config.enable_subgraph {
        for node in &mut graph.node {
            for attr in &mut node.attribute {
                if let Some(subgraph) = attr.g.as_mut() {
                    let sub = quantize_graph(subgraph, config)?;
                    summary.quantized += sub.quantized;
                    summary.skipped += sub.skipped;
                }
                for subgraph in &mut attr.graphs {
                    let sub = quantize_graph(subgraph, config)?;
                    summary.quantized += sub.quantized;
                    summary.skipped += sub.skipped;
                }
            }
        }
    }

    Ok(summary)
}

/// Selects the weights to quantize: float initializers consumed by
/// allow-listed operators, deduplicated across consumers.
fn plan_weights(
    graph: &GraphProto,
    config: &QuantConfig,
    summary: &mut QuantSummary,
) -> Vec<(String, WeightPlan)> {
    let init_index = graph.initializer_index();
    let min_rank = if config.force_quantize { 1 } else { 2 };

    let mut plans: Vec<(String, WeightPlan)> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for (node_idx, node) in graph.node.iter().enumerate() {
        if !config.op_types.iter().any(|op| *op == node.op_type) {
            continue;
        }
        for (input_idx, input) in node.input.iter().enumerate() {
            let Some(&init_idx) = init_index.get(input) else {
                continue;
            };
            let init = &graph.initializer[init_idx];
            if !init.is_float() {
                continue;
            }
            if init.dims.len() < min_rank {
                summary.skipped += 1;
                continue;
            }

            match by_name.get(input) {
                Some(&plan_idx) => plans[plan_idx].1.consumers.push((node_idx, input_idx)),
                None => {
                    // MatMul weights are quantized along columns; everything
                    // else along the output-channel axis.
                    let axis = if node.op_type == "MatMul" {
                        init.dims.len() - 1
                    } else {
                        0
                    };
                    by_name.insert(input.clone(), plans.len());
                    plans.push((
                        input.clone(),
                        WeightPlan {
                            init_idx,
                            axis,
                            consumers: vec![(node_idx, input_idx)],
                        },
                    ));
                }
            }
        }
    }

    plans
}

// =============================================================================
// Quantization Math
// =============================================================================

/// Quantized weight payload: stored bytes plus per-channel parameters.
struct QuantizedData {
    values: Vec<u8>,
    scales: Vec<f32>,
    zero_points: Vec<u8>,
}

/// Linear quantization parameters for one channel (or the whole tensor).
#[derive(Clone, Copy)]
struct QuantParams {
    scale: f32,
    zero_point: f32,
}

fn quantize_tensor_data(
    data: &[f32],
    dims: &[i64],
    axis: usize,
    config: &QuantConfig,
) -> QuantResult<QuantizedData> {
    if config.per_channel {
        quantize_per_channel(data, dims, axis, config)
    } else {
        let params = compute_params(data, config);
        let values = quantize_values(data, |_| params, config);
        Ok(QuantizedData {
            values,
            scales: vec![params.scale],
            zero_points: encode_zero_points(&[params], config),
        })
    }
}

fn quantize_per_channel(
    data: &[f32],
    dims: &[i64],
    axis: usize,
    config: &QuantConfig,
) -> QuantResult<QuantizedData> {
    if axis >= dims.len() {
        return Err(QuantError::InvalidAxis {
            axis,
            rank: dims.len(),
        });
    }

    let channels = dims[axis].max(1) as usize;
    let inner: usize = dims[axis + 1..].iter().map(|&d| d.max(0) as usize).product();
    let outer: usize = dims[..axis].iter().map(|&d| d.max(0) as usize).product();

    let params: Vec<QuantParams> = (0..channels)
        .into_par_iter()
        .map(|c| {
            let mut values = Vec::with_capacity(outer * inner);
            for o in 0..outer {
                let start = (o * channels + c) * inner;
                values.extend_from_slice(&data[start..start + inner]);
            }
            compute_params(&values, config)
        })
        .collect();

    let channel_of = |idx: usize| (idx / inner) % channels;
    let values = quantize_values(data, |idx| params[channel_of(idx)], config);

    Ok(QuantizedData {
        values,
        scales: params.iter().map(|p| p.scale).collect(),
        zero_points: encode_zero_points(&params, config),
    })
}

/// Computes scale and zero point for one channel of values.
fn compute_params(values: &[f32], config: &QuantConfig) -> QuantParams {
    if config.weight_symmetric {
        let max_abs = values.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
        let qmax = if config.reduce_range { 64.0 } else { 127.0 };
        let scale = if max_abs > 0.0 { max_abs / qmax } else { 1.0 };
        let zero_point = match config.weight_type {
            WeightType::QInt8 => 0.0,
            WeightType::QUInt8 => 128.0,
        };
        QuantParams { scale, zero_point }
    } else {
        // Widen the range to include zero so it stays exactly representable.
        let mut rmin = 0.0f32;
        let mut rmax = 0.0f32;
        for &v in values {
            rmin = rmin.min(v);
            rmax = rmax.max(v);
        }
        let span = if config.reduce_range { 127.0 } else { 255.0 };
        let scale = if rmax > rmin { (rmax - rmin) / span } else { 1.0 };
        let (qmin, qmax) = match config.weight_type {
            WeightType::QUInt8 => (0.0, span),
            WeightType::QInt8 => (-128.0, 127.0f32.min(span - 128.0).max(0.0)),
        };
        let zero_point = (qmin - rmin / scale).round().clamp(qmin, qmax);
        QuantParams { scale, zero_point }
    }
}

/// Quantizes each value with its channel parameters into stored bytes.
fn quantize_values<F>(data: &[f32], params_of: F, config: &QuantConfig) -> Vec<u8>
where
    F: Fn(usize) -> QuantParams + Sync,
{
    let (qmin, qmax) = quantized_range(config);
    data.par_iter()
        .enumerate()
        .map(|(idx, &v)| {
            let p = params_of(idx);
            let q = (v / p.scale + p.zero_point).round().clamp(qmin, qmax);
            match config.weight_type {
                WeightType::QUInt8 => q as u8,
                WeightType::QInt8 => (q as i8) as u8,
            }
        })
        .collect()
}

fn quantized_range(config: &QuantConfig) -> (f32, f32) {
    match (config.weight_type, config.reduce_range, config.weight_symmetric) {
        (WeightType::QUInt8, false, _) => (0.0, 255.0),
        (WeightType::QUInt8, true, _) => (0.0, 127.0),
        (WeightType::QInt8, false, true) => (-127.0, 127.0),
        (WeightType::QInt8, true, true) => (-64.0, 64.0),
        (WeightType::QInt8, false, false) => (-128.0, 127.0),
        (WeightType::QInt8, true, false) => (-64.0, 63.0),
    }
}

fn encode_zero_points(params: &[QuantParams], config: &QuantConfig) -> Vec<u8> {
    params
        .iter()
        .map(|p| match config.weight_type {
            WeightType::QUInt8 => p.zero_point as u8,
            WeightType::QInt8 => (p.zero_point as i8) as u8,
        })
        .collect()
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
