//! The thirteen named pipeline sections.
//!
//! Section names are protocol surface: they appear as `pipeline <section>`
//! arguments and as `/draws/<eid>/pipeline/<section>` path components.
//! Enum-typed replay values are already symbolic strings in the snapshot.

use core_replay::{PipeSnapshot, Stage};
use serde_json::{json, Value};

use crate::sanitize_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Topology,
    Viewport,
    Scissor,
    Blend,
    Stencil,
    VInputs,
    Samplers,
    VBuffers,
    IBuffer,
    PushConstants,
    Rasterizer,
    DepthStencil,
    Msaa,
}

impl Section {
    pub const ALL: [Section; 13] = [
        Section::Topology,
        Section::Viewport,
        Section::Scissor,
        Section::Blend,
        Section::Stencil,
        Section::VInputs,
        Section::Samplers,
        Section::VBuffers,
        Section::IBuffer,
        Section::PushConstants,
        Section::Rasterizer,
        Section::DepthStencil,
        Section::Msaa,
    ];

    /// Parse a user-facing section name. `vinputs`/`vertex-inputs` and the
    /// dashed spellings are both accepted.
    pub fn parse(s: &str) -> Option<Section> {
        match s {
            "topology" => Some(Section::Topology),
            "viewport" => Some(Section::Viewport),
            "scissor" => Some(Section::Scissor),
            "blend" => Some(Section::Blend),
            "stencil" => Some(Section::Stencil),
            "vinputs" | "vertex-inputs" => Some(Section::VInputs),
            "samplers" => Some(Section::Samplers),
            "vbuffers" => Some(Section::VBuffers),
            "ibuffer" => Some(Section::IBuffer),
            "push-constants" | "push_constants" => Some(Section::PushConstants),
            "rasterizer" => Some(Section::Rasterizer),
            "depth-stencil" | "depth_stencil" => Some(Section::DepthStencil),
            "msaa" => Some(Section::Msaa),
            _ => None,
        }
    }

    /// RPC method implementing this section.
    pub fn method_name(self) -> &'static str {
        match self {
            Section::Topology => "pipe_topology",
            Section::Viewport => "pipe_viewport",
            Section::Scissor => "pipe_scissor",
            Section::Blend => "pipe_blend",
            Section::Stencil => "pipe_stencil",
            Section::VInputs => "pipe_vinputs",
            Section::Samplers => "pipe_samplers",
            Section::VBuffers => "pipe_vbuffers",
            Section::IBuffer => "pipe_ibuffer",
            Section::PushConstants => "pipe_push_constants",
            Section::Rasterizer => "pipe_rasterizer",
            Section::DepthStencil => "pipe_depth_stencil",
            Section::Msaa => "pipe_msaa",
        }
    }
}

/// Build the JSON row for one section at `eid`.
pub fn section_row(section: Section, eid: u64, snap: &PipeSnapshot) -> Value {
    match section {
        Section::Topology => json!({"eid": eid, "topology": snap.topology}),
        Section::Viewport => {
            let vp = &snap.viewport;
            json!({
                "eid": eid,
                "x": vp.x, "y": vp.y,
                "width": vp.width, "height": vp.height,
                "minDepth": vp.min_depth, "maxDepth": vp.max_depth,
            })
        }
        Section::Scissor => {
            let sc = &snap.scissor;
            json!({
                "eid": eid,
                "x": sc.x, "y": sc.y,
                "width": sc.width, "height": sc.height,
                "enabled": sc.enabled,
            })
        }
        Section::Blend => {
            let rows: Vec<Value> = snap
                .blends
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    json!({
                        "rt": i,
                        "enabled": b.enabled,
                        "srcColor": b.src_color, "dstColor": b.dst_color, "colorOp": b.color_op,
                        "srcAlpha": b.src_alpha, "dstAlpha": b.dst_alpha, "alphaOp": b.alpha_op,
                        "writeMask": b.write_mask,
                    })
                })
                .collect();
            json!({"eid": eid, "blends": rows})
        }
        Section::Stencil => {
            let face = |f: &core_replay::StencilFace| {
                json!({
                    "failOperation": f.fail_op,
                    "depthFailOperation": f.depth_fail_op,
                    "passOperation": f.pass_op,
                    "function": f.function,
                    "reference": f.reference,
                    "compareMask": f.compare_mask,
                    "writeMask": f.write_mask,
                })
            };
            json!({"eid": eid, "front": face(&snap.stencil_front), "back": face(&snap.stencil_back)})
        }
        Section::VInputs => {
            let rows: Vec<Value> = snap
                .vertex_inputs
                .iter()
                .map(|vi| {
                    json!({
                        "name": vi.name,
                        "vertexBuffer": vi.vertex_buffer,
                        "byteOffset": vi.byte_offset,
                        "perInstance": vi.per_instance,
                        "instanceRate": vi.instance_rate,
                        "format": vi.format_name,
                    })
                })
                .collect();
            json!({"eid": eid, "inputs": rows})
        }
        Section::Samplers => {
            let rows: Vec<Value> = snap
                .samplers
                .iter()
                .map(|s| {
                    json!({
                        "stage": s.stage.name(),
                        "slot": s.slot,
                        "addressU": s.address_u, "addressV": s.address_v, "addressW": s.address_w,
                        "filter": s.filter,
                        "maxAnisotropy": s.max_anisotropy,
                        "minLOD": s.min_lod, "maxLOD": s.max_lod,
                        "mipBias": s.mip_bias,
                    })
                })
                .collect();
            json!({"eid": eid, "samplers": rows})
        }
        Section::VBuffers => {
            let rows: Vec<Value> = snap
                .vbuffers
                .iter()
                .enumerate()
                .map(|(i, vb)| {
                    json!({
                        "slot": i,
                        "resourceId": vb.resource,
                        "byteOffset": vb.byte_offset,
                        "byteSize": sanitize_size(vb.byte_size),
                        "byteStride": vb.byte_stride,
                    })
                })
                .collect();
            json!({"eid": eid, "vbuffers": rows})
        }
        Section::IBuffer => {
            let ib = &snap.ibuffer;
            json!({
                "eid": eid,
                "resourceId": ib.resource,
                "byteOffset": ib.byte_offset,
                "byteSize": sanitize_size(ib.byte_size),
                "byteStride": ib.byte_stride,
            })
        }
        Section::PushConstants => {
            let mut rows: Vec<Value> = Vec::new();
            for stage in Stage::ALL {
                let binding = snap.stage(stage);
                if binding.shader == 0 {
                    continue;
                }
                if let Some(refl) = &binding.reflection {
                    if refl.push_constant_byte_size > 0 {
                        rows.push(json!({
                            "stage": stage.name(),
                            "offset": refl.push_constant_byte_offset,
                            "size": refl.push_constant_byte_size,
                        }));
                    }
                }
            }
            json!({"eid": eid, "push_constants": rows})
        }
        Section::Rasterizer => {
            let mut row = serde_json::Map::new();
            row.insert("eid".into(), json!(eid));
            if let Some(r) = &snap.rasterizer {
                row.insert("fillMode".into(), json!(r.fill_mode));
                row.insert("cullMode".into(), json!(r.cull_mode));
                row.insert("frontCCW".into(), json!(r.front_ccw));
                row.insert("depthBiasEnable".into(), json!(r.depth_bias_enable));
                row.insert(
                    "depthBiasConstantFactor".into(),
                    json!(r.depth_bias_constant_factor),
                );
                row.insert("depthBiasClamp".into(), json!(r.depth_bias_clamp));
                row.insert("depthBiasSlopeFactor".into(), json!(r.depth_bias_slope_factor));
                row.insert("lineWidth".into(), json!(r.line_width));
            }
            Value::Object(row)
        }
        Section::DepthStencil => {
            let mut row = serde_json::Map::new();
            row.insert("eid".into(), json!(eid));
            if let Some(ds) = &snap.depth_stencil {
                row.insert("depthTestEnable".into(), json!(ds.depth_test_enable));
                row.insert("depthWriteEnable".into(), json!(ds.depth_write_enable));
                row.insert("depthFunction".into(), json!(ds.depth_function));
                row.insert("depthBoundsEnable".into(), json!(ds.depth_bounds_enable));
                row.insert("minDepthBounds".into(), json!(ds.min_depth_bounds));
                row.insert("maxDepthBounds".into(), json!(ds.max_depth_bounds));
                row.insert("stencilTestEnable".into(), json!(ds.stencil_test_enable));
            }
            Value::Object(row)
        }
        Section::Msaa => {
            let mut row = serde_json::Map::new();
            row.insert("eid".into(), json!(eid));
            if let Some(ms) = &snap.multisample {
                row.insert("rasterSamples".into(), json!(ms.raster_samples));
                row.insert("sampleShadingEnable".into(), json!(ms.sample_shading_enable));
                row.insert("minSampleShading".into(), json!(ms.min_sample_shading));
                row.insert("sampleMask".into(), json!(ms.sample_mask));
            }
            Value::Object(row)
        }
    }
}
