//! Model Preprocessing
//!
//! Prepares a model for quantization: propagates static tensor shapes into
//! `value_info`, removes pass-through nodes (Identity, inference-mode
//! Dropout), and prunes initializers nothing references anymore.
//!
//! Shape inference here is deliberately best-effort. Operators it does not
//! know simply stop propagation along that path; preprocessing never fails
//! a pipeline over an exotic graph.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::collections::{HashMap, HashSet};

use crate::error::OnnxResult;
use crate::proto::{GraphProto, ModelProto, NodeProto, TensorDataType, ValueInfo};

// =============================================================================
// Public API
// =============================================================================

/// Preprocesses a model in place: graph cleanup followed by shape inference.
pub fn preprocess(model: &mut ModelProto) -> OnnxResult<()> {
    if let Some(graph) = model.graph.as_mut() {
        eliminate_passthrough_nodes(graph);
        infer_shapes(graph);
        prune_initializers(graph);
    }
    Ok(())
}

// =============================================================================
// Pass-Through Elimination
// =============================================================================

/// Removes Identity nodes and inference-mode Dropout nodes, rewiring their
/// consumers to the original producer.
fn eliminate_passthrough_nodes(graph: &mut GraphProto) {
    let graph_outputs: HashSet<String> = graph.output.iter().map(|v| v.name.clone()).collect();

    let mut consumed: HashSet<String> = HashSet::new();
    for node in &graph.node {
        consumed.extend(node.input.iter().cloned());
    }

    let mut rename: HashMap<String, String> = HashMap::new();
    graph.node.retain(|node| {
        if !is_passthrough(node, &consumed, &graph_outputs) {
            return true;
        }
        rename.insert(node.output[0].clone(), node.input[0].clone());
        false
    });

    if rename.is_empty() {
        return;
    }

    for node in &mut graph.node {
        for input in &mut node.input {
            let resolved = {
                let mut name = input.as_str();
                // Follow chains of removed nodes.
                while let Some(next) = rename.get(name) {
                    name = next.as_str();
                }
                if name == input.as_str() {
                    None
                } else {
                    Some(name.to_string())
                }
            };
            if let Some(name) = resolved {
                *input = name;
            }
        }
    }
}

fn is_passthrough(
    node: &NodeProto,
    consumed: &HashSet<String>,
    graph_outputs: &HashSet<String>,
) -> bool {
    if node.output.is_empty() || node.input.is_empty() {
        return false;
    }
    if graph_outputs.contains(&node.output[0]) {
        return false;
    }

    match node.op_type.as_str() {
        "Identity" => true,
        "Dropout" => {
            // Removable only when the mask output is unused.
            node.output.len() < 2
                || (!consumed.contains(&node.output[1]) && !graph_outputs.contains(&node.output[1]))
        }
        _ => false,
    }
}

// =============================================================================
// Shape Inference
// =============================================================================

/// Known element type and static shape of a tensor.
type TensorInfo = (i32, Vec<i64>);

/// Propagates static shapes through the graph, recording results in
/// `value_info` for intermediate tensors.
fn infer_shapes(graph: &mut GraphProto) {
    let mut known: HashMap<String, TensorInfo> = HashMap::new();

    for input in &graph.input {
        if let (Some(elem), Some(dims)) = (input.elem_type(), input.static_shape()) {
            known.insert(input.name.clone(), (elem, dims));
        }
    }
    for init in &graph.initializer {
        known.insert(init.name.clone(), (init.data_type, init.dims.clone()));
    }
    for vi in &graph.value_info {
        if let (Some(elem), Some(dims)) = (vi.elem_type(), vi.static_shape()) {
            known.insert(vi.name.clone(), (elem, dims));
        }
    }

    for node in &graph.node {
        if let Some(outputs) = infer_node(node, &known, graph) {
            for (name, info) in outputs {
                known.entry(name).or_insert(info);
            }
        }
    }

    let skip: HashSet<String> = graph
        .input
        .iter()
        .chain(graph.output.iter())
        .chain(graph.value_info.iter())
        .map(|v| v.name.clone())
        .chain(graph.initializer.iter().map(|t| t.name.clone()))
        .collect();

    let mut inferred: Vec<ValueInfo> = Vec::new();
    for node in &graph.node {
        for output in &node.output {
            if skip.contains(output) {
                continue;
            }
            if let Some((elem, dims)) = known.get(output) {
                let elem_type =
                    TensorDataType::from_i32(*elem).unwrap_or(TensorDataType::Undefined);
                inferred.push(ValueInfo::tensor(output, elem_type, dims));
            }
        }
    }
    graph.value_info.extend(inferred);
}

/// Looks up the known info of a node input by position.
fn input_info<'a>(
    node: &NodeProto,
    known: &'a HashMap<String, TensorInfo>,
    idx: usize,
) -> Option<&'a TensorInfo> {
    node.input.get(idx).and_then(|name| known.get(name))
}

/// Infers the output shapes of a single node, if its rule is known.
fn infer_node(
    node: &NodeProto,
    known: &HashMap<String, TensorInfo>,
    graph: &GraphProto,
) -> Option<Vec<(String, TensorInfo)>> {
    let first = |idx: usize| input_info(node, known, idx);

    let out = |info: TensorInfo| -> Option<Vec<(String, TensorInfo)>> {
        node.output
            .first()
            .map(|name| vec![(name.clone(), info)])
    };

    match node.op_type.as_str() {
        // Element-wise unary: output mirrors the (first) input.
        "Relu" | "LeakyRelu" | "Sigmoid" | "Tanh" | "Softmax" | "Erf" | "Exp" | "Log"
        | "Sqrt" | "Neg" | "Abs" | "Identity" | "Clip" | "Elu" | "Selu" | "Softplus"
        | "HardSigmoid" | "Ceil" | "Floor" | "Round" | "Sign" | "Reciprocal" | "Dropout"
        | "BatchNormalization" => {
            let (elem, dims) = first(0)?.clone();
            out((elem, dims))
        }

        "Cast" => {
            let (_, dims) = first(0)?.clone();
            let to = node.get_int("to")? as i32;
            out((to, dims))
        }

        // Binary (or variadic) ops with numpy broadcasting.
        "Add" | "Sub" | "Mul" | "Div" | "Pow" | "Min" | "Max" | "Sum" => {
            let (elem, mut dims) = first(0)?.clone();
            for input in node.input.iter().skip(1) {
                let (_, other) = known.get(input)?;
                dims = broadcast_shapes(&dims, other)?;
            }
            out((elem, dims))
        }

        "MatMul" => {
            let (elem, a) = first(0)?;
            let (_, b) = first(1)?;
            out((*elem, matmul_shape(a, b)?))
        }

        "Gemm" => {
            let (elem, a) = first(0)?;
            let (_, b) = first(1)?;
            if a.len() != 2 || b.len() != 2 {
                return None;
            }
            let trans_a = node.get_int("transA").unwrap_or(0) != 0;
            let trans_b = node.get_int("transB").unwrap_or(0) != 0;
            let m = if trans_a { a[1] } else { a[0] };
            let n = if trans_b { b[0] } else { b[1] };
            out((*elem, vec![m, n]))
        }

        "Conv" => {
            let (elem, x) = first(0)?;
            let (_, w) = first(1)?;
            out((*elem, conv_shape(node, x, w)?))
        }

        "MaxPool" | "AveragePool" => {
            let (elem, x) = first(0)?;
            out((*elem, pool_shape(node, x)?))
        }

        "GlobalAveragePool" | "GlobalMaxPool" => {
            let (elem, x) = first(0)?;
            if x.len() < 3 {
                return None;
            }
            let mut dims = vec![x[0], x[1]];
            dims.extend(std::iter::repeat(1).take(x.len() - 2));
            out((*elem, dims))
        }

        "Reshape" => {
            let (elem, x) = first(0)?;
            if node.get_int("allowzero").unwrap_or(0) != 0 {
                return None;
            }
            let shape_init = graph.get_initializer(node.input.get(1)?)?;
            out((*elem, reshape_dims(x, &shape_init.get_int64_data())?))
        }

        "Transpose" => {
            let (elem, x) = first(0)?;
            let dims = match node.get_ints("perm") {
                Some(perm) => {
                    if perm.len() != x.len() {
                        return None;
                    }
                    perm.iter().map(|&p| x.get(p as usize).copied()).collect::<Option<Vec<_>>>()?
                }
                None => x.iter().rev().copied().collect(),
            };
            out((*elem, dims))
        }

        "Flatten" => {
            let (elem, x) = first(0)?;
            let rank = x.len() as i64;
            let mut axis = node.get_int("axis").unwrap_or(1);
            if axis < 0 {
                axis += rank;
            }
            if axis < 0 || axis > rank {
                return None;
            }
            let split = axis as usize;
            let outer: i64 = x[..split].iter().product();
            let inner: i64 = x[split..].iter().product();
            out((*elem, vec![outer, inner]))
        }

        "Concat" => {
            let mut axis = node.get_int("axis")?;
            let (elem, base) = first(0)?.clone();
            let rank = base.len() as i64;
            if axis < 0 {
                axis += rank;
            }
            if axis < 0 || axis >= rank {
                return None;
            }
            let axis = axis as usize;
            let mut dims = base;
            for input in node.input.iter().skip(1) {
                let (_, other) = known.get(input)?;
                if other.len() != dims.len() {
                    return None;
                }
                dims[axis] += other[axis];
            }
            out((elem, dims))
        }

        "Squeeze" => {
            let (elem, x) = first(0)?.clone();
            let axes = ints_from_attr_or_input(node, "axes", 1, graph);
            let dims = squeeze_dims(&x, axes.as_deref())?;
            out((elem, dims))
        }

        "Unsqueeze" => {
            let (elem, x) = first(0)?.clone();
            let axes = ints_from_attr_or_input(node, "axes", 1, graph)?;
            let dims = unsqueeze_dims(&x, &axes)?;
            out((elem, dims))
        }

        _ => None,
    }
}

/// Reads an int-list either from an attribute (older opsets) or from a
/// constant trailing input (newer opsets).
fn ints_from_attr_or_input(
    node: &NodeProto,
    attr: &str,
    input_idx: usize,
    graph: &GraphProto,
) -> Option<Vec<i64>> {
    if let Some(ints) = node.get_ints(attr) {
        return Some(ints.to_vec());
    }
    let name = node.input.get(input_idx)?;
    graph.get_initializer(name).map(|t| t.get_int64_data())
}

// =============================================================================
// Shape Arithmetic
// =============================================================================

/// Numpy-style broadcasting of two static shapes.
fn broadcast_shapes(a: &[i64], b: &[i64]) -> Option<Vec<i64>> {
    let rank = a.len().max(b.len());
    let mut result = Vec::with_capacity(rank);
    for i in 0..rank {
        let da = if i < rank - a.len() { 1 } else { a[i - (rank - a.len())] };
        let db = if i < rank - b.len() { 1 } else { b[i - (rank - b.len())] };
        if da == db || db == 1 {
            result.push(da);
        } else if da == 1 {
            result.push(db);
        } else {
            return None;
        }
    }
    Some(result)
}

fn matmul_shape(a: &[i64], b: &[i64]) -> Option<Vec<i64>> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    if a[a.len() - 1] != b[b.len() - 2] {
        return None;
    }
    let batch = broadcast_shapes(&a[..a.len() - 2], &b[..b.len() - 2])?;
    let mut dims = batch;
    dims.push(a[a.len() - 2]);
    dims.push(b[b.len() - 1]);
    Some(dims)
}

fn conv_shape(node: &NodeProto, x: &[i64], w: &[i64]) -> Option<Vec<i64>> {
    if x.len() < 3 || w.len() != x.len() {
        return None;
    }
    if let Some(attr) = node.get_attribute("auto_pad") {
        if attr.get_string().as_deref().unwrap_or("NOTSET") != "NOTSET" {
            return None;
        }
    }

    let spatial = x.len() - 2;
    let kernel: Vec<i64> = match node.get_ints("kernel_shape") {
        Some(k) => k.to_vec(),
        None => w[2..].to_vec(),
    };
    let dims = spatial_dims(node, &x[2..], &kernel, spatial)?;

    let mut result = vec![x[0], w[0]];
    result.extend(dims);
    Some(result)
}

fn pool_shape(node: &NodeProto, x: &[i64]) -> Option<Vec<i64>> {
    if x.len() < 3 {
        return None;
    }
    if node.get_int("ceil_mode").unwrap_or(0) != 0 {
        return None;
    }
    if let Some(attr) = node.get_attribute("auto_pad") {
        if attr.get_string().as_deref().unwrap_or("NOTSET") != "NOTSET" {
            return None;
        }
    }

    let spatial = x.len() - 2;
    let kernel = node.get_ints("kernel_shape")?.to_vec();
    let dims = spatial_dims(node, &x[2..], &kernel, spatial)?;

    let mut result = vec![x[0], x[1]];
    result.extend(dims);
    Some(result)
}

/// Standard convolution/pooling output-size arithmetic.
fn spatial_dims(
    node: &NodeProto,
    input: &[i64],
    kernel: &[i64],
    spatial: usize,
) -> Option<Vec<i64>> {
    if kernel.len() != spatial {
        return None;
    }
    let strides = node
        .get_ints("strides")
        .map_or_else(|| vec![1; spatial], <[i64]>::to_vec);
    let dilations = node
        .get_ints("dilations")
        .map_or_else(|| vec![1; spatial], <[i64]>::to_vec);
    let pads = node
        .get_ints("pads")
        .map_or_else(|| vec![0; spatial * 2], <[i64]>::to_vec);
    if strides.len() != spatial || dilations.len() != spatial || pads.len() != spatial * 2 {
        return None;
    }

    let mut dims = Vec::with_capacity(spatial);
    for i in 0..spatial {
        let effective_kernel = dilations[i] * (kernel[i] - 1) + 1;
        let numerator = input[i] + pads[i] + pads[i + spatial] - effective_kernel;
        if numerator < 0 || strides[i] <= 0 {
            return None;
        }
        dims.push(numerator / strides[i] + 1);
    }
    Some(dims)
}

fn reshape_dims(input: &[i64], target: &[i64]) -> Option<Vec<i64>> {
    let numel: i64 = input.iter().product();
    let mut dims: Vec<i64> = Vec::with_capacity(target.len());
    let mut infer_idx = None;

    for (i, &d) in target.iter().enumerate() {
        match d {
            0 => dims.push(*input.get(i)?),
            -1 => {
                if infer_idx.is_some() {
                    return None;
                }
                infer_idx = Some(i);
                dims.push(1);
            }
            d if d > 0 => dims.push(d),
            _ => return None,
        }
    }

    let known: i64 = dims.iter().product();
    if let Some(idx) = infer_idx {
        if known == 0 || numel % known != 0 {
            return None;
        }
        dims[idx] = numel / known;
    } else if known != numel {
        return None;
    }
    Some(dims)
}

fn squeeze_dims(input: &[i64], axes: Option<&[i64]>) -> Option<Vec<i64>> {
    let rank = input.len() as i64;
    match axes {
        None => Some(input.iter().copied().filter(|&d| d != 1).collect()),
        Some(axes) => {
            let mut remove = HashSet::new();
            for &axis in axes {
                let axis = if axis < 0 { axis + rank } else { axis };
                if axis < 0 || axis >= rank || input[axis as usize] != 1 {
                    return None;
                }
                remove.insert(axis as usize);
            }
            Some(
                input
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !remove.contains(i))
                    .map(|(_, &d)| d)
                    .collect(),
            )
        }
    }
}

fn unsqueeze_dims(input: &[i64], axes: &[i64]) -> Option<Vec<i64>> {
    let out_rank = (input.len() + axes.len()) as i64;
    let mut insert: Vec<usize> = Vec::with_capacity(axes.len());
    for &axis in axes {
        let axis = if axis < 0 { axis + out_rank } else { axis };
        if axis < 0 || axis >= out_rank {
            return None;
        }
        insert.push(axis as usize);
    }
    insert.sort_unstable();
    insert.dedup();
    if insert.len() != axes.len() {
        return None;
    }

    let mut dims = Vec::with_capacity(out_rank as usize);
    let mut src = input.iter();
    for i in 0..out_rank as usize {
        if insert.contains(&i) {
            dims.push(1);
        } else {
            dims.push(*src.next()?);
        }
    }
    Some(dims)
}

// =============================================================================
// Initializer Pruning
// =============================================================================

/// Drops initializers no node or graph output references, along with any
/// old-style graph input entries that shadowed them.
fn prune_initializers(graph: &mut GraphProto) {
    let mut referenced: HashSet<&str> = HashSet::new();
    for node in &graph.node {
        referenced.extend(node.input.iter().map(String::as_str));
    }
    let output_names: HashSet<&str> = graph.output.iter().map(|v| v.name.as_str()).collect();

    let mut removed: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(graph.initializer.len());
    for init in graph.initializer.drain(..) {
        if referenced.contains(init.name.as_str()) || output_names.contains(init.name.as_str()) {
            kept.push(init);
        } else {
            removed.insert(init.name);
        }
    }
    graph.initializer = kept;

    if !removed.is_empty() {
        graph.input.retain(|v| !removed.contains(&v.name));
    }
}

// =============================================================================
// Tests
// =============================================================================
