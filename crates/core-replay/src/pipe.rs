//! Pipeline snapshot model.
//!
//! A [`PipeSnapshot`] is a plain value describing every bound object at the
//! cursor's event. Enum-typed replay fields are carried as their symbolic
//! names (`"TriangleList"`, `"SrcAlpha"`, ...) — consumers must never see
//! numeric reprs. A snapshot is only coherent while the cursor sits at the
//! event it was taken for.

use serde::{Deserialize, Serialize};

use crate::types::Stage;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub min_depth: f32,
    #[serde(default = "one_f32")]
    pub max_depth: f32,
}

fn one_f32() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlendAttachment {
    pub enabled: bool,
    pub src_color: String,
    pub dst_color: String,
    pub color_op: String,
    pub src_alpha: String,
    pub dst_alpha: String,
    pub alpha_op: String,
    pub write_mask: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StencilFace {
    pub fail_op: String,
    pub depth_fail_op: String,
    pub pass_op: String,
    pub function: String,
    pub reference: u32,
    pub compare_mask: u32,
    pub write_mask: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexFormat {
    pub name: String,
    pub comp_count: u32,
    pub comp_byte_width: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexInput {
    pub name: String,
    pub vertex_buffer: u32,
    pub byte_offset: u64,
    pub per_instance: bool,
    pub instance_rate: u32,
    pub format_name: String,
    pub comp_count: u32,
    pub comp_byte_width: u32,
}

/// A bound vertex or index buffer region. `byte_size == u64::MAX` means
/// "to the end of the buffer" and renders as `"-"`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoundBuffer {
    pub resource: u64,
    pub byte_offset: u64,
    pub byte_size: u64,
    pub byte_stride: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerBinding {
    pub stage: Stage,
    pub set: u32,
    pub slot: u32,
    pub address_u: String,
    pub address_v: String,
    pub address_w: String,
    pub filter: String,
    pub max_anisotropy: u32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub mip_bias: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterizerState {
    pub fill_mode: String,
    pub cull_mode: String,
    pub front_ccw: bool,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_function: String,
    pub depth_bounds_enable: bool,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
    pub stencil_test_enable: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MsaaState {
    pub raster_samples: u32,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub sample_mask: u32,
}

/// Signature row of a shader input or output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigParam {
    pub name: String,
    pub semantic: String,
    pub location: u32,
    pub comp_count: u32,
    pub comp_type: String,
}

/// A read-only or read-write resource binding declared by a shader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderResource {
    pub name: String,
    pub set: u32,
    pub slot: u32,
}

/// Declared shape of one constant-buffer variable (possibly a struct).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub members: Vec<VarDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstantBlock {
    pub name: String,
    pub set: u32,
    pub slot: u32,
    pub byte_size: u64,
    #[serde(default)]
    pub variables: Vec<VarDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub contents: String,
}

/// Shader reflection: signatures, resource bindings, constant blocks and
/// (when the capture has them) embedded debug sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShaderReflection {
    pub entry_point: String,
    #[serde(default)]
    pub input_signature: Vec<SigParam>,
    #[serde(default)]
    pub output_signature: Vec<SigParam>,
    #[serde(default)]
    pub ro_resources: Vec<ShaderResource>,
    #[serde(default)]
    pub rw_resources: Vec<ShaderResource>,
    #[serde(default)]
    pub constant_blocks: Vec<ConstantBlock>,
    #[serde(default)]
    pub push_constant_byte_offset: u64,
    #[serde(default)]
    pub push_constant_byte_size: u64,
    #[serde(default)]
    pub debug_files: Vec<SourceFile>,
}

/// What is actually bound behind one declared binding: the resource id,
/// its format (textures / typed buffers, empty otherwise) and the bound
/// byte range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundDescriptor {
    pub resource: u64,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub byte_offset: u64,
    #[serde(default)]
    pub byte_size: u64,
}

/// Runtime contents of one constant-buffer variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub members: Vec<VarValue>,
    #[serde(default)]
    pub f32v: Vec<f32>,
    #[serde(default)]
    pub u32v: Vec<u32>,
    #[serde(default)]
    pub s32v: Vec<i32>,
}

/// Per-stage binding: shader identity, entry point, reflection, the bound
/// descriptors behind each declared binding (parallel to the reflection's
/// `ro_resources` / `rw_resources` / `constant_blocks`), and the runtime
/// constant-buffer contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageBinding {
    pub shader: u64,
    #[serde(default)]
    pub entry: String,
    #[serde(default)]
    pub reflection: Option<ShaderReflection>,
    #[serde(default)]
    pub ro_bindings: Vec<BoundDescriptor>,
    #[serde(default)]
    pub rw_bindings: Vec<BoundDescriptor>,
    #[serde(default)]
    pub cbuffer_bindings: Vec<BoundDescriptor>,
    #[serde(default)]
    pub cbuffer_values: Vec<Vec<VarValue>>,
}

/// Full fixed-function + per-stage state at one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipeSnapshot {
    pub topology: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub scissor: ScissorRect,
    #[serde(default)]
    pub blends: Vec<BlendAttachment>,
    #[serde(default)]
    pub stencil_front: StencilFace,
    #[serde(default)]
    pub stencil_back: StencilFace,
    #[serde(default)]
    pub vertex_inputs: Vec<VertexInput>,
    #[serde(default)]
    pub vbuffers: Vec<BoundBuffer>,
    #[serde(default)]
    pub ibuffer: BoundBuffer,
    #[serde(default)]
    pub samplers: Vec<SamplerBinding>,
    #[serde(default)]
    pub rasterizer: Option<RasterizerState>,
    #[serde(default)]
    pub depth_stencil: Option<DepthStencilState>,
    #[serde(default)]
    pub multisample: Option<MsaaState>,
    #[serde(default)]
    pub stages: [StageBinding; 6],
    #[serde(default)]
    pub color_targets: Vec<u64>,
    #[serde(default)]
    pub depth_target: u64,
    #[serde(default = "default_graphics_pipeline")]
    pub graphics_pipeline: u64,
    #[serde(default = "default_compute_pipeline")]
    pub compute_pipeline: u64,
}

fn default_graphics_pipeline() -> u64 {
    1
}

fn default_compute_pipeline() -> u64 {
    2
}

impl PipeSnapshot {
    pub fn stage(&self, stage: Stage) -> &StageBinding {
        &self.stages[stage.index()]
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageBinding {
        &mut self.stages[stage.index()]
    }

    /// The pipeline object backing a stage (compute for cs, graphics else).
    pub fn pipeline_for(&self, stage: Stage) -> u64 {
        if stage == Stage::Cs {
            self.compute_pipeline
        } else {
            self.graphics_pipeline
        }
    }
}
