//! The replay capability trait.
//!
//! One implementor lives in this workspace ([`crate::fixture::FixtureReplay`]);
//! a real renderdoc FFI binding is a second implementor outside it. All
//! cursor-relative methods answer for the event last passed to
//! [`ReplayControl::set_frame_event`]; callers go through
//! [`crate::cursor::Cursor`] rather than calling that method directly.

use std::path::Path;

use crate::pipe::{PipeSnapshot, VarValue};
use crate::types::{
    Action, ApiChunk, ApiProperties, BufferDesc, CaptureInfo, CounterDesc, DebugMessage,
    EventUsage, MeshData, MeshStage, Overlay, PixelMod, ResourceDesc, Stage, Subresource,
    TextureDesc, TextureSave, TraceHandle, TraceStep,
};

/// Failure inside the replay layer. Everything that is not a caller mistake
/// surfaces as `Ffi` and becomes an internal error on the wire, with the
/// underlying description preserved.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("{0}")]
    Ffi(String),
    #[error("shader compile failed: {0}")]
    Compile(String),
    #[error("{0} not supported by this capture")]
    Unsupported(&'static str),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

pub trait ReplayControl: Send {
    // Capture-wide data, stable for the session lifetime.
    fn root_actions(&self) -> &[Action];
    fn resources(&self) -> &[ResourceDesc];
    fn textures(&self) -> &[TextureDesc];
    fn buffers(&self) -> &[BufferDesc];
    fn structured_chunks(&self) -> &[ApiChunk];
    fn api_properties(&self) -> ApiProperties;
    fn capture_info(&self) -> Option<CaptureInfo>;

    /// Move the replay cursor. Raw seek: range checking and call caching are
    /// the cursor's job, not the backend's.
    fn set_frame_event(&mut self, eid: u64) -> ReplayResult<()>;

    /// Pipeline state at the current cursor.
    fn pipe_snapshot(&self) -> PipeSnapshot;

    /// Runtime contents of one constant block of the stage bound at the
    /// current cursor, by reflection block index.
    fn cbuffer_contents(&self, stage: Stage, block: usize) -> ReplayResult<Vec<VarValue>>;

    /// Raw bytes of a buffer range. `len == 0` reads to the end.
    fn buffer_data(&self, resource: u64, offset: u64, len: u64) -> ReplayResult<Vec<u8>>;

    fn texture_data(&self, resource: u64, sub: Subresource) -> ReplayResult<Vec<u8>>;

    fn save_texture(&self, spec: TextureSave, path: &Path) -> ReplayResult<()>;

    /// Channel-wise min/max of a subresource, as RGBA float quadruples.
    fn min_max(&self, resource: u64, sub: Subresource) -> ReplayResult<([f32; 4], [f32; 4])>;

    fn histogram(
        &self,
        resource: u64,
        sub: Subresource,
        channel: usize,
        range: (f32, f32),
    ) -> ReplayResult<Vec<u64>>;

    /// Post-transform vertex stream for the draw at the current cursor.
    fn postvs(&self, stage: MeshStage) -> ReplayResult<MeshData>;

    fn debug_messages(&mut self) -> Vec<DebugMessage>;

    /// Ordered usage history of one resource across the whole frame.
    fn usage(&self, resource: u64) -> Vec<EventUsage>;

    fn counters(&self) -> Vec<CounterDesc>;

    fn pixel_history(&self, resource: u64, x: u32, y: u32) -> ReplayResult<Vec<PixelMod>>;

    /// Render a debug overlay over a color target at the current cursor and
    /// return the overlay texture id (0 on failure).
    fn render_overlay(
        &mut self,
        target: u64,
        overlay: Overlay,
        width: u32,
        height: u32,
    ) -> ReplayResult<u64>;

    fn disasm_targets(&self) -> Vec<String>;

    /// Disassembly of a shader bound at the current cursor.
    fn disassemble(&self, shader: u64, target: &str) -> ReplayResult<String>;

    // --- shader debugging -------------------------------------------------

    /// `None` means no fragment / vertex / thread to debug at this event.
    fn debug_pixel(&mut self, x: u32, y: u32, sample: u32) -> ReplayResult<Option<TraceHandle>>;

    /// `idx` is the index value fed to the vertex (equal to `vtx` for
    /// non-indexed draws); `view` selects the multiview instance.
    fn debug_vertex(
        &mut self,
        vtx: u64,
        instance: u64,
        idx: u64,
        view: u32,
    ) -> ReplayResult<Option<TraceHandle>>;
    fn debug_thread(
        &mut self,
        group: [u32; 3],
        thread: [u32; 3],
    ) -> ReplayResult<Option<TraceHandle>>;

    /// Next batch of trace steps; empty means the trace is exhausted.
    fn continue_debug(&mut self, trace: &TraceHandle) -> ReplayResult<Vec<TraceStep>>;

    /// Invalidates the trace. Must be called on every exit path, including
    /// after a `continue_debug` error.
    fn free_trace(&mut self, trace: TraceHandle);

    // --- shader edit / replace --------------------------------------------

    fn shader_encodings(&self) -> Vec<String>;

    /// Compile source into a new shader resource; returns its id.
    fn build_shader(
        &mut self,
        stage: Stage,
        source: &str,
        encoding: &str,
        entry: &str,
    ) -> ReplayResult<u64>;

    fn replace_resource(&mut self, original: u64, replacement: u64) -> ReplayResult<()>;
    fn remove_replacement(&mut self, original: u64) -> ReplayResult<()>;
    fn free_custom_shader(&mut self, shader: u64) -> ReplayResult<()>;

    fn shutdown(&mut self);
}

/// Opens a capture file into a live replay. The daemon is generic over this
/// so the fixture backend and a real FFI backend are interchangeable.
pub trait CaptureOpener: Send + Sync {
    fn open_capture(&self, path: &Path) -> ReplayResult<Box<dyn ReplayControl + Send>>;
}
