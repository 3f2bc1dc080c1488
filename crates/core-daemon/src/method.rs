//! The method catalog as a closed enum.
//!
//! Method names are protocol surface; routing through an enum instead of a
//! handler table makes the dispatch match exhaustive at compile time.

use core_pipeline::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Ping,
    OpenCapture,
    Shutdown,

    Info,
    Stats,
    Log,
    Events,
    Draws,
    Event,
    Draw,
    Passes,
    Pass,
    PassDeps,
    Resources,
    Resource,
    Usage,
    Count,
    Search,
    ShaderMap,

    Pipeline,
    Pipe(Section),
    Bindings,
    Descriptors,

    Shader,
    Shaders,
    ShadersPreload,
    ShaderTargets,
    ShaderReflect,
    ShaderConstants,
    ShaderSource,
    ShaderDisasm,
    ShaderAll,
    ShaderListInfo,
    ShaderListDisasm,

    TexInfo,
    TexExport,
    TexRaw,
    RtExport,
    RtDepth,
    RtOverlay,
    TexStats,

    BufInfo,
    BufRaw,
    Postvs,
    MeshData,
    CbufferDecode,
    VbufferDecode,
    IbufferDecode,

    CounterList,
    PixelHistory,

    VfsLs,
    VfsTree,

    DebugPixel,
    DebugVertex,
    DebugThread,

    ShaderEncodings,
    ShaderBuild,
    ShaderReplace,
    ShaderRestore,
    ShaderRestoreAll,
}

impl Method {
    pub fn parse(name: &str) -> Option<Method> {
        let method = match name {
            "ping" => Method::Ping,
            "open_capture" => Method::OpenCapture,
            "shutdown" => Method::Shutdown,

            "info" => Method::Info,
            "stats" => Method::Stats,
            "log" => Method::Log,
            "events" => Method::Events,
            "draws" => Method::Draws,
            "event" => Method::Event,
            "draw" => Method::Draw,
            "passes" => Method::Passes,
            "pass" => Method::Pass,
            "pass_deps" => Method::PassDeps,
            "resources" => Method::Resources,
            "resource" => Method::Resource,
            "usage" => Method::Usage,
            "count" => Method::Count,
            "search" => Method::Search,
            "shader_map" => Method::ShaderMap,

            "pipeline" => Method::Pipeline,
            "pipe_topology" => Method::Pipe(Section::Topology),
            "pipe_viewport" => Method::Pipe(Section::Viewport),
            "pipe_scissor" => Method::Pipe(Section::Scissor),
            "pipe_blend" => Method::Pipe(Section::Blend),
            "pipe_stencil" => Method::Pipe(Section::Stencil),
            "pipe_vinputs" => Method::Pipe(Section::VInputs),
            "pipe_samplers" => Method::Pipe(Section::Samplers),
            "pipe_vbuffers" => Method::Pipe(Section::VBuffers),
            "pipe_ibuffer" => Method::Pipe(Section::IBuffer),
            "pipe_push_constants" => Method::Pipe(Section::PushConstants),
            "pipe_rasterizer" => Method::Pipe(Section::Rasterizer),
            "pipe_depth_stencil" => Method::Pipe(Section::DepthStencil),
            "pipe_msaa" => Method::Pipe(Section::Msaa),
            "bindings" => Method::Bindings,
            "descriptors" => Method::Descriptors,

            "shader" => Method::Shader,
            "shaders" => Method::Shaders,
            "shaders_preload" => Method::ShadersPreload,
            "shader_targets" => Method::ShaderTargets,
            "shader_reflect" => Method::ShaderReflect,
            "shader_constants" => Method::ShaderConstants,
            "shader_source" => Method::ShaderSource,
            "shader_disasm" => Method::ShaderDisasm,
            "shader_all" => Method::ShaderAll,
            "shader_list_info" => Method::ShaderListInfo,
            "shader_list_disasm" => Method::ShaderListDisasm,

            "tex_info" => Method::TexInfo,
            "tex_export" => Method::TexExport,
            "tex_raw" => Method::TexRaw,
            "rt_export" => Method::RtExport,
            "rt_depth" => Method::RtDepth,
            "rt_overlay" => Method::RtOverlay,
            "tex_stats" => Method::TexStats,

            "buf_info" => Method::BufInfo,
            "buf_raw" => Method::BufRaw,
            "postvs" => Method::Postvs,
            "mesh_data" => Method::MeshData,
            "cbuffer_decode" => Method::CbufferDecode,
            "vbuffer_decode" => Method::VbufferDecode,
            "ibuffer_decode" => Method::IbufferDecode,

            "counter_list" => Method::CounterList,
            "pixel_history" => Method::PixelHistory,

            "vfs_ls" => Method::VfsLs,
            "vfs_tree" => Method::VfsTree,

            "debug_pixel" => Method::DebugPixel,
            "debug_vertex" => Method::DebugVertex,
            "debug_thread" => Method::DebugThread,

            "shader_encodings" => Method::ShaderEncodings,
            "shader_build" => Method::ShaderBuild,
            "shader_replace" => Method::ShaderReplace,
            "shader_restore" => Method::ShaderRestore,
            "shader_restore_all" => Method::ShaderRestoreAll,

            _ => return None,
        };
        Some(method)
    }

    /// Methods that skip the token gate.
    pub fn is_open(self) -> bool {
        self == Method::Ping
    }
}
