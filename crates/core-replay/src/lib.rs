//! Replay capability layer.
//!
//! Everything above this crate treats the GPU replay as an opaque capability:
//! a mutable cursor over a captured frame plus cursor-relative queries for
//! pipeline state, resources, buffer contents and shader debugging. The
//! [`ReplayControl`] trait is the single seam; the real FFI binding lives
//! outside this workspace, while [`fixture::FixtureReplay`] implements the
//! same contract in memory for tests and for the binary's fixture mode.
//!
//! Cursor discipline is the load-bearing invariant here: one query may
//! invalidate another's result, so every consumer routes seeks through
//! [`cursor::Cursor`], which also suppresses redundant FFI calls.

pub mod control;
pub mod cursor;
pub mod fixture;
pub mod pipe;
pub mod types;

pub use control::{CaptureOpener, ReplayControl, ReplayError};
pub use cursor::{Cursor, SeekError};
pub use pipe::{
    BlendAttachment, BoundBuffer, BoundDescriptor, ConstantBlock, DepthStencilState, MsaaState,
    PipeSnapshot, RasterizerState, SamplerBinding, ScissorRect, ShaderReflection, ShaderResource,
    SigParam, SourceFile, StageBinding, StencilFace, VarDef, VarValue, VertexFormat, VertexInput,
    Viewport,
};
pub use types::{
    Action, ActionFlags, ApiChunk, ApiEvent, ApiProperties, BufferDesc, CaptureInfo, CounterDesc,
    DebugMessage, EventUsage, MeshData, MeshStage, Overlay, PixelMod, ResourceDesc, Stage,
    Subresource, TextureDesc, TextureSave, TraceHandle, TraceStep, UsageKind, VarChange, VarData,
};

/// Byte-size sentinel the replay reports for "whole buffer" bindings.
pub const SIZE_SENTINEL: u64 = u64::MAX;
