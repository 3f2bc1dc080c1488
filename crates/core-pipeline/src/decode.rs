//! Constant/vertex/index-buffer and post-transform decode.
//!
//! All functions are pure over bytes the caller already fetched; component
//! decode supports float32, float16 and uint8-normalized layouts.

use core_replay::{MeshData, PipeSnapshot, VarValue};
use serde_json::{json, Value};

/// Recursion bound for constant flattening; reflected structs can be cyclic
/// through the FFI, so depth is capped rather than trusted.
const FLATTEN_DEPTH_CAP: usize = 8;

fn extract_value(v: &VarValue) -> Value {
    let count = ((v.rows.max(1)) * (v.cols.max(1))) as usize;
    fn take<T: Clone + serde::Serialize>(values: &[T], count: usize) -> Value {
        let taken: Vec<T> = values.iter().take(count).cloned().collect();
        if taken.len() == 1 {
            json!(taken[0])
        } else {
            json!(taken)
        }
    }
    if !v.f32v.is_empty() {
        take(&v.f32v, count)
    } else if !v.u32v.is_empty() {
        take(&v.u32v, count)
    } else if !v.s32v.is_empty() {
        take(&v.s32v, count)
    } else {
        Value::Null
    }
}

fn flatten_into(vars: &[VarValue], prefix: &str, depth: usize, out: &mut Vec<Value>) {
    if depth > FLATTEN_DEPTH_CAP {
        return;
    }
    for v in vars {
        let name = format!("{prefix}{}", v.name);
        if !v.members.is_empty() {
            flatten_into(&v.members, &format!("{name}."), depth + 1, out);
        } else {
            out.push(json!({
                "name": name,
                "type": v.ty,
                "value": extract_value(v),
            }));
        }
    }
}

/// Flatten nested constant-buffer variables into `{name, type, value}` rows
/// with dot-joined names.
pub fn flatten_cbuffer_vars(vars: &[VarValue]) -> Vec<Value> {
    let mut out = Vec::new();
    flatten_into(vars, "", 0, &mut out);
    out
}

fn decode_component(data: &[u8], offset: usize, width: usize) -> f64 {
    if offset + width > data.len() {
        return 0.0;
    }
    match width {
        4 => f32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as f64,
        2 => half::f16::from_le_bytes([data[offset], data[offset + 1]]).to_f64(),
        1 => data[offset] as f64 / 255.0,
        _ => 0.0,
    }
}

/// Decode bound vertex buffers into named component columns.
///
/// `buffer_bytes[slot]` holds the raw bytes of vertex buffer `slot` (fetched
/// at its bound offset). Vertex count defaults to buffer 0's length over its
/// stride when not supplied.
pub fn decode_vbuffers(
    eid: u64,
    snap: &PipeSnapshot,
    buffer_bytes: &[Vec<u8>],
    count: Option<usize>,
) -> Value {
    if snap.vertex_inputs.is_empty() {
        return json!({"eid": eid, "columns": [], "vertices": []});
    }

    let mut columns: Vec<String> = Vec::new();
    for vi in &snap.vertex_inputs {
        let comp_count = vi.comp_count.max(1) as usize;
        if comp_count == 1 {
            columns.push(vi.name.clone());
        } else {
            for suffix in ["x", "y", "z", "w"].iter().take(comp_count) {
                columns.push(format!("{}.{suffix}", vi.name));
            }
        }
    }

    let num_verts = count.unwrap_or_else(|| {
        let stride = snap.vbuffers.first().map(|vb| vb.byte_stride).unwrap_or(0) as usize;
        let len = buffer_bytes.first().map(Vec::len).unwrap_or(0);
        if stride > 0 {
            len / stride
        } else {
            0
        }
    });

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(num_verts);
    for vertex in 0..num_verts {
        let mut row: Vec<f64> = Vec::with_capacity(columns.len());
        for vi in &snap.vertex_inputs {
            let slot = vi.vertex_buffer as usize;
            let empty: Vec<u8> = Vec::new();
            let data = buffer_bytes.get(slot).unwrap_or(&empty);
            let stride = snap
                .vbuffers
                .get(slot)
                .map(|vb| vb.byte_stride)
                .unwrap_or(0) as usize;
            let base = vertex * stride + vi.byte_offset as usize;
            let width = vi.comp_byte_width.max(1) as usize;
            for comp in 0..vi.comp_count.max(1) as usize {
                row.push(decode_component(data, base + comp * width, width));
            }
        }
        vertices.push(row);
    }

    json!({"eid": eid, "columns": columns, "vertices": vertices})
}

/// Decode the bound index buffer; u16 or u32 chosen by stride, `"none"`
/// when no index buffer is bound.
pub fn decode_ibuffer(eid: u64, snap: &PipeSnapshot, data: &[u8]) -> Value {
    if snap.ibuffer.resource == 0 {
        return json!({"eid": eid, "format": "none", "indices": []});
    }
    let stride = match snap.ibuffer.byte_stride {
        2 | 4 => snap.ibuffer.byte_stride as usize,
        _ => 2,
    };
    let indices = decode_indices(data, stride);
    let format = if stride == 2 { "uint16" } else { "uint32" };
    json!({"eid": eid, "format": format, "indices": indices})
}

fn decode_indices(data: &[u8], stride: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(data.len() / stride.max(1));
    let mut offset = 0;
    while offset + stride <= data.len() {
        let v = match stride {
            2 => u16::from_le_bytes([data[offset], data[offset + 1]]) as u64,
            4 => u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]) as u64,
            _ => 0,
        };
        out.push(v);
        offset += stride;
    }
    out
}

/// Decode a post-transform vertex stream into position rows, with indices
/// included when the index stride is 2 or 4.
pub fn decode_mesh(
    eid: u64,
    stage_name: &str,
    mesh: &MeshData,
    vertex_raw: &[u8],
    index_raw: &[u8],
) -> Value {
    let stride = mesh.vertex_byte_stride as usize;
    let comp_count = if mesh.format.comp_count == 0 {
        4
    } else {
        mesh.format.comp_count as usize
    };
    let comp_width = if mesh.format.comp_byte_width == 0 {
        4
    } else {
        mesh.format.comp_byte_width as usize
    };

    let mut num_verts = if stride > 0 { vertex_raw.len() / stride } else { 0 };
    // Without an index buffer the draw consumed exactly num_indices vertices.
    if mesh.num_indices > 0 && mesh.index_resource == 0 {
        num_verts = num_verts.min(mesh.num_indices as usize);
    }

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(num_verts);
    for i in 0..num_verts {
        let base = i * stride;
        let mut comps = Vec::with_capacity(comp_count);
        for c in 0..comp_count {
            comps.push(decode_component(vertex_raw, base + c * comp_width, comp_width));
        }
        vertices.push(comps);
    }

    let indices = if mesh.index_resource != 0 && matches!(mesh.index_byte_stride, 2 | 4) {
        decode_indices(index_raw, mesh.index_byte_stride as usize)
    } else {
        Vec::new()
    };

    json!({
        "eid": eid,
        "stage": stage_name,
        "topology": mesh.topology,
        "vertex_count": vertices.len(),
        "comp_count": comp_count,
        "stride": stride,
        "vertices": vertices,
        "index_count": indices.len(),
        "indices": indices,
    })
}
