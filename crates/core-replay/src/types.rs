//! Capture data model: actions, resources, usage records, debug traces.
//!
//! These are plain owned values. The replay backend materializes them once
//! (or per seek for cursor-relative data); nothing in here borrows from the
//! FFI layer, which is what lets the rest of the workspace hold results
//! across later cursor moves.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flag word attached to every captured action. The serde form is the
    /// flag-name string (`"DRAWCALL | INDEXED"`), provided by bitflags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
    pub struct ActionFlags: u32 {
        const DRAWCALL      = 0x0001;
        const INDEXED       = 0x0002;
        const DISPATCH      = 0x0010;
        const MESH_DISPATCH = 0x0008;
        const CLEAR         = 0x0020;
        const COPY          = 0x0040;
        const PASS_BOUNDARY = 0x1000;
        const BEGIN_PASS    = 0x2000;
        const END_PASS      = 0x4000;
        const MESH_DRAW     = 0x0004;
        const SET_MARKER    = 0x0100;
    }
}

/// Reference from an action into the structured chunk stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ApiEvent {
    pub eid: u64,
    pub chunk_index: usize,
}

/// One chunk of the capture's structured file: the API call name plus its
/// already-stringified parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiChunk {
    pub name: String,
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

/// A node in the captured command-stream tree.
///
/// Invariant: children carry event ids strictly between this action's id and
/// the next sibling's; flattening preserves depth-first order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub eid: u64,
    #[serde(default)]
    pub flags: ActionFlags,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub num_indices: u64,
    #[serde(default)]
    pub num_instances: u64,
    #[serde(default)]
    pub children: Vec<Action>,
    #[serde(default)]
    pub api_events: Vec<ApiEvent>,
}

impl Action {
    /// Triangle estimate for this action: `(indices / 3) * max(instances, 1)`.
    pub fn triangles(&self) -> u64 {
        (self.num_indices / 3) * self.num_instances.max(1)
    }
}

/// Base resource row. Width/height/format live on [`TextureDesc`] and
/// [`BufferDesc`], not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDesc {
    pub id: u64,
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureDesc {
    pub resource: u64,
    #[serde(rename = "type")]
    pub ty: String,
    pub dimension: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "one_u32")]
    pub depth: u32,
    #[serde(default = "one_u32")]
    pub mips: u32,
    #[serde(default = "one_u32")]
    pub array_size: u32,
    pub format: String,
    #[serde(default)]
    pub byte_size: u64,
    #[serde(default)]
    pub creation_flags: u64,
    #[serde(default)]
    pub cubemap: bool,
    #[serde(default = "one_u32")]
    pub ms_samp: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BufferDesc {
    pub resource: u64,
    pub length: u64,
    #[serde(default)]
    pub creation_flags: u64,
    #[serde(default)]
    pub gpu_address: u64,
}

fn one_u32() -> u32 {
    1
}

/// The six shader stages in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Vs,
    Hs,
    Ds,
    Gs,
    Ps,
    Cs,
}

impl Stage {
    pub const ALL: [Stage; 6] = [Stage::Vs, Stage::Hs, Stage::Ds, Stage::Gs, Stage::Ps, Stage::Cs];

    pub fn index(self) -> usize {
        match self {
            Stage::Vs => 0,
            Stage::Hs => 1,
            Stage::Ds => 2,
            Stage::Gs => 3,
            Stage::Ps => 4,
            Stage::Cs => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Vs => "vs",
            Stage::Hs => "hs",
            Stage::Ds => "ds",
            Stage::Gs => "gs",
            Stage::Ps => "ps",
            Stage::Cs => "cs",
        }
    }

    pub fn parse(s: &str) -> Option<Stage> {
        match s {
            "vs" => Some(Stage::Vs),
            "hs" => Some(Stage::Hs),
            "ds" => Some(Stage::Ds),
            "gs" => Some(Stage::Gs),
            "ps" => Some(Stage::Ps),
            "cs" => Some(Stage::Cs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiProperties {
    pub api: String,
    #[serde(default)]
    pub degraded: bool,
}

/// Capture-file level metadata surfaced by the `info` method when available.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CaptureInfo {
    pub has_callstacks: bool,
    pub machine_ident: u64,
    pub timestamp_base: u64,
}

/// Validation-layer message recorded during replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugMessage {
    /// Raw severity as reported by the replay; mapped to a level name at the
    /// query layer so unknown values degrade to `UNKNOWN`.
    pub severity: u32,
    pub eid: u64,
    pub message: String,
}

/// How a resource was touched at one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageKind {
    VertexBuffer,
    IndexBuffer,
    PsResource,
    CsResource,
    CsRwResource,
    ColorTarget,
    DepthStencilTarget,
    Clear,
    CopySrc,
    CopyDst,
    ResolveSrc,
    ResolveDst,
    GenMips,
    Other,
}

impl UsageKind {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            UsageKind::ColorTarget
                | UsageKind::DepthStencilTarget
                | UsageKind::CsRwResource
                | UsageKind::Clear
                | UsageKind::CopyDst
                | UsageKind::GenMips
                | UsageKind::ResolveDst
        )
    }

    pub fn is_read(self) -> bool {
        matches!(
            self,
            UsageKind::PsResource
                | UsageKind::CsResource
                | UsageKind::VertexBuffer
                | UsageKind::IndexBuffer
                | UsageKind::CopySrc
                | UsageKind::ResolveSrc
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            UsageKind::VertexBuffer => "VertexBuffer",
            UsageKind::IndexBuffer => "IndexBuffer",
            UsageKind::PsResource => "PS_Resource",
            UsageKind::CsResource => "CS_Resource",
            UsageKind::CsRwResource => "CS_RWResource",
            UsageKind::ColorTarget => "ColorTarget",
            UsageKind::DepthStencilTarget => "DepthStencilTarget",
            UsageKind::Clear => "Clear",
            UsageKind::CopySrc => "CopySrc",
            UsageKind::CopyDst => "CopyDst",
            UsageKind::ResolveSrc => "ResolveSrc",
            UsageKind::ResolveDst => "ResolveDst",
            UsageKind::GenMips => "GenMips",
            UsageKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventUsage {
    pub eid: u64,
    pub kind: UsageKind,
}

/// A (mip, slice, sample) triple addressing part of a texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subresource {
    pub mip: u32,
    pub slice: u32,
    pub sample: u32,
}

/// Parameters for a PNG export of one subresource.
#[derive(Debug, Clone, Copy)]
pub struct TextureSave {
    pub resource: u64,
    pub mip: u32,
    pub slice: u32,
}

/// Debug overlay renderings supported by `rt_overlay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Wireframe,
    Depth,
    Stencil,
    Backface,
    Viewport,
    Nan,
    Clipping,
    Overdraw,
    TriangleSize,
}

/// GPU counter description (the capture decides which exist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CounterDesc {
    pub id: u32,
    pub name: String,
    pub unit: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub category: String,
}

/// One fragment's contribution in a pixel history query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixelMod {
    pub eid: u64,
    pub fragment: u32,
    pub depth: Option<f32>,
    pub passed: bool,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Post-transform vertex stream description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertex_resource: u64,
    pub vertex_byte_offset: u64,
    pub vertex_byte_size: u64,
    pub vertex_byte_stride: u64,
    pub format: crate::pipe::VertexFormat,
    pub num_indices: u64,
    pub index_resource: u64,
    pub index_byte_offset: u64,
    pub index_byte_size: u64,
    pub index_byte_stride: u64,
    pub topology: String,
}

/// Post-transform stages addressable by `mesh_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshStage {
    VsOut,
    GsOut,
}

impl MeshStage {
    pub fn parse(s: &str) -> Option<MeshStage> {
        match s {
            "vs-out" => Some(MeshStage::VsOut),
            "gs-out" => Some(MeshStage::GsOut),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MeshStage::VsOut => "vs-out",
            MeshStage::GsOut => "gs-out",
        }
    }
}

/// Opaque handle to an in-flight shader debug trace.
///
/// The replay invalidates everything behind the handle on `free_trace`, so
/// callers must copy `stage` out before freeing.
#[derive(Debug)]
pub struct TraceHandle {
    pub id: u64,
    pub stage: Stage,
}

/// Numeric payload of one debugged variable, discriminated by base type.
#[derive(Debug, Clone, PartialEq)]
pub enum VarData {
    Float(Vec<f32>),
    UInt(Vec<u32>),
    SInt(Vec<i32>),
}

impl Default for VarData {
    fn default() -> Self {
        VarData::Float(Vec::new())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VarChange {
    pub name: String,
    pub ty: String,
    pub rows: u32,
    pub cols: u32,
    pub before: VarData,
    pub after: VarData,
}

#[derive(Debug, Clone, Default)]
pub struct TraceStep {
    pub instruction: u64,
    pub file: String,
    pub line: u64,
    pub changes: Vec<VarChange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangles_scale_by_instances() {
        let a = Action {
            num_indices: 900,
            num_instances: 4,
            ..Action::default()
        };
        assert_eq!(a.triangles(), 1200);
    }

    #[test]
    fn triangles_treat_zero_instances_as_one() {
        let a = Action {
            num_indices: 300,
            num_instances: 0,
            ..Action::default()
        };
        assert_eq!(a.triangles(), 100);
    }

    #[test]
    fn stage_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::parse(stage.name()), Some(stage));
        }
        assert_eq!(Stage::parse("xx"), None);
    }

    #[test]
    fn usage_read_write_sets_are_disjoint() {
        let all = [
            UsageKind::VertexBuffer,
            UsageKind::IndexBuffer,
            UsageKind::PsResource,
            UsageKind::CsResource,
            UsageKind::CsRwResource,
            UsageKind::ColorTarget,
            UsageKind::DepthStencilTarget,
            UsageKind::Clear,
            UsageKind::CopySrc,
            UsageKind::CopyDst,
            UsageKind::ResolveSrc,
            UsageKind::ResolveDst,
            UsageKind::GenMips,
            UsageKind::Other,
        ];
        for kind in all {
            assert!(!(kind.is_read() && kind.is_write()), "{kind:?}");
        }
        assert!(!UsageKind::Other.is_read());
        assert!(!UsageKind::Other.is_write());
    }
}
