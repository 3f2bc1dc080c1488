//! In-memory replay backend.
//!
//! Implements [`ReplayControl`] over data supplied up front: an action tree,
//! resource tables, per-event pipeline snapshots, buffer bytes, usage
//! histories and canned debug traces. Used by every test in the workspace
//! and by the binary's fixture mode (`*.json` captures). The backend also
//! counts `set_frame_event` calls so tests can assert the single-pass /
//! cursor-cache contracts.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::control::{CaptureOpener, ReplayControl, ReplayError, ReplayResult};
use crate::pipe::{PipeSnapshot, VarValue};
use crate::types::{
    Action, ApiChunk, ApiProperties, BufferDesc, CaptureInfo, CounterDesc, DebugMessage,
    EventUsage, MeshData, MeshStage, Overlay, PixelMod, ResourceDesc, Stage, Subresource,
    TextureDesc, TextureSave, TraceHandle, TraceStep,
};

/// Serializable subset of a fixture capture, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureCapture {
    #[serde(default = "default_api")]
    pub api: String,
    #[serde(default)]
    pub capture_info: Option<CaptureInfo>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub resources: Vec<ResourceDesc>,
    #[serde(default)]
    pub textures: Vec<TextureDesc>,
    #[serde(default)]
    pub buffers: Vec<BufferDesc>,
    #[serde(default)]
    pub chunks: Vec<ApiChunk>,
    #[serde(default)]
    pub snapshots: HashMap<u64, PipeSnapshot>,
    #[serde(default)]
    pub default_snapshot: Option<PipeSnapshot>,
    #[serde(default)]
    pub buffer_data: HashMap<u64, Vec<u8>>,
    #[serde(default)]
    pub usage: HashMap<u64, Vec<EventUsage>>,
    #[serde(default)]
    pub disasm: HashMap<u64, String>,
    #[serde(default = "default_targets")]
    pub disasm_targets: Vec<String>,
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
    #[serde(default)]
    pub debug_messages: Vec<DebugMessage>,
    #[serde(default)]
    pub counters: Vec<CounterDesc>,
}

fn default_api() -> String {
    "Vulkan".to_owned()
}

fn default_targets() -> Vec<String> {
    vec!["SPIR-V".to_owned()]
}

fn default_encodings() -> Vec<String> {
    vec!["glsl".to_owned(), "hlsl".to_owned(), "spirv-asm".to_owned()]
}

/// A canned debug trace: the stage it reports plus step batches returned by
/// successive `continue_debug` calls.
#[derive(Debug, Clone, Default)]
pub struct FixtureTrace {
    pub stage: Option<Stage>,
    pub batches: Vec<Vec<TraceStep>>,
}

/// Shared observation handle. Clone it before handing the replay to a
/// daemon; the counters keep updating behind the trait object.
#[derive(Debug, Clone, Default)]
pub struct FixtureProbe {
    seeks: Arc<AtomicU64>,
    freed_traces: Arc<Mutex<Vec<u64>>>,
    live_traces: Arc<AtomicU64>,
    freed_shaders: Arc<Mutex<Vec<u64>>>,
    shutdown: Arc<AtomicBool>,
    vertex_debug_args: Arc<Mutex<Option<(u64, u64, u64, u32)>>>,
}

impl FixtureProbe {
    pub fn seek_count(&self) -> u64 {
        self.seeks.load(Ordering::SeqCst)
    }

    /// The `(vtx, instance, idx, view)` tuple of the last `debug_vertex`
    /// call, if any.
    pub fn vertex_debug_args(&self) -> Option<(u64, u64, u64, u32)> {
        *self.vertex_debug_args.lock().unwrap()
    }

    pub fn freed_trace_count(&self) -> usize {
        self.freed_traces.lock().unwrap().len()
    }

    pub fn live_trace_count(&self) -> u64 {
        self.live_traces.load(Ordering::SeqCst)
    }

    pub fn freed_shaders(&self) -> Vec<u64> {
        self.freed_shaders.lock().unwrap().clone()
    }

    pub fn shutdown_called(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct FixtureReplay {
    capture: FixtureCapture,
    texture_data: HashMap<u64, Vec<u8>>,
    min_max: HashMap<u64, ([f32; 4], [f32; 4])>,
    histograms: HashMap<u64, Vec<u64>>,
    postvs: HashMap<MeshStage, MeshData>,
    pixel_history: HashMap<u64, Vec<PixelMod>>,
    overlay_texture: u64,
    pixel_trace: Option<FixtureTrace>,
    vertex_trace: Option<FixtureTrace>,
    thread_trace: Option<FixtureTrace>,
    compile_error: Option<String>,
    fail_texture_saves: bool,
    fail_continue_debug: bool,

    current_eid: u64,
    next_shader_id: u64,
    next_trace_id: u64,
    replacements: HashMap<u64, u64>,
    built_shaders: Vec<u64>,
    live_traces: HashMap<u64, VecDeque<Vec<TraceStep>>>,
    probe: FixtureProbe,
}

impl FixtureReplay {
    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    pub fn from_capture(capture: FixtureCapture) -> Self {
        Self {
            capture,
            overlay_texture: 0,
            next_shader_id: 9000,
            next_trace_id: 1,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_capture(serde_json::from_str(text)?))
    }

    // Test observability.

    pub fn probe(&self) -> FixtureProbe {
        self.probe.clone()
    }

    pub fn seek_count(&self) -> u64 {
        self.probe.seek_count()
    }

    pub fn current_eid(&self) -> u64 {
        self.current_eid
    }

    pub fn live_trace_count(&self) -> usize {
        self.live_traces.len()
    }

    pub fn built_shaders(&self) -> &[u64] {
        &self.built_shaders
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }

    fn start_trace(&mut self, source: &Option<FixtureTrace>) -> Option<TraceHandle> {
        let trace = source.as_ref()?;
        let stage = trace.stage?;
        let id = self.next_trace_id;
        self.next_trace_id += 1;
        self.live_traces
            .insert(id, trace.batches.clone().into_iter().collect());
        self.probe
            .live_traces
            .store(self.live_traces.len() as u64, Ordering::SeqCst);
        Some(TraceHandle { id, stage })
    }
}

impl ReplayControl for FixtureReplay {
    fn root_actions(&self) -> &[Action] {
        &self.capture.actions
    }

    fn resources(&self) -> &[ResourceDesc] {
        &self.capture.resources
    }

    fn textures(&self) -> &[TextureDesc] {
        &self.capture.textures
    }

    fn buffers(&self) -> &[BufferDesc] {
        &self.capture.buffers
    }

    fn structured_chunks(&self) -> &[ApiChunk] {
        &self.capture.chunks
    }

    fn api_properties(&self) -> ApiProperties {
        ApiProperties {
            api: self.capture.api.clone(),
            degraded: false,
        }
    }

    fn capture_info(&self) -> Option<CaptureInfo> {
        self.capture.capture_info
    }

    fn set_frame_event(&mut self, eid: u64) -> ReplayResult<()> {
        self.current_eid = eid;
        self.probe.seeks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pipe_snapshot(&self) -> PipeSnapshot {
        let mut snap = self
            .capture
            .snapshots
            .get(&self.current_eid)
            .or(self.capture.default_snapshot.as_ref())
            .cloned()
            .unwrap_or_default();
        // Active replacements surface through the snapshot, like the live
        // replay rebinding a swapped shader.
        for binding in snap.stages.iter_mut() {
            if let Some(&replacement) = self.replacements.get(&binding.shader) {
                binding.shader = replacement;
            }
        }
        snap
    }

    fn cbuffer_contents(&self, stage: Stage, block: usize) -> ReplayResult<Vec<VarValue>> {
        let snap = self.pipe_snapshot();
        Ok(snap
            .stage(stage)
            .cbuffer_values
            .get(block)
            .cloned()
            .unwrap_or_default())
    }

    fn buffer_data(&self, resource: u64, offset: u64, len: u64) -> ReplayResult<Vec<u8>> {
        let data = match self.capture.buffer_data.get(&resource) {
            Some(d) => d.as_slice(),
            None => return Ok(Vec::new()),
        };
        let start = (offset as usize).min(data.len());
        let end = if len == 0 {
            data.len()
        } else {
            (start + len as usize).min(data.len())
        };
        Ok(data[start..end].to_vec())
    }

    fn texture_data(&self, resource: u64, _sub: Subresource) -> ReplayResult<Vec<u8>> {
        Ok(self.texture_data.get(&resource).cloned().unwrap_or_default())
    }

    fn save_texture(&self, spec: TextureSave, path: &Path) -> ReplayResult<()> {
        if self.fail_texture_saves {
            return Err(ReplayError::Ffi("SaveTexture failed".to_owned()));
        }
        // Minimal PNG-shaped payload so size/path contracts are observable.
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        bytes.extend_from_slice(&spec.resource.to_le_bytes());
        bytes.extend_from_slice(&spec.mip.to_le_bytes());
        std::fs::write(path, bytes).map_err(|e| ReplayError::Ffi(e.to_string()))
    }

    fn min_max(&self, resource: u64, _sub: Subresource) -> ReplayResult<([f32; 4], [f32; 4])> {
        Ok(self
            .min_max
            .get(&resource)
            .copied()
            .unwrap_or(([0.0; 4], [1.0; 4])))
    }

    fn histogram(
        &self,
        resource: u64,
        _sub: Subresource,
        _channel: usize,
        _range: (f32, f32),
    ) -> ReplayResult<Vec<u64>> {
        Ok(self
            .histograms
            .get(&resource)
            .cloned()
            .unwrap_or_else(|| vec![0; 16]))
    }

    fn postvs(&self, stage: MeshStage) -> ReplayResult<MeshData> {
        Ok(self.postvs.get(&stage).cloned().unwrap_or_default())
    }

    fn debug_messages(&mut self) -> Vec<DebugMessage> {
        self.capture.debug_messages.clone()
    }

    fn usage(&self, resource: u64) -> Vec<EventUsage> {
        self.capture.usage.get(&resource).cloned().unwrap_or_default()
    }

    fn counters(&self) -> Vec<CounterDesc> {
        self.capture.counters.clone()
    }

    fn pixel_history(&self, resource: u64, _x: u32, _y: u32) -> ReplayResult<Vec<PixelMod>> {
        Ok(self.pixel_history.get(&resource).cloned().unwrap_or_default())
    }

    fn render_overlay(
        &mut self,
        _target: u64,
        _overlay: Overlay,
        _width: u32,
        _height: u32,
    ) -> ReplayResult<u64> {
        Ok(self.overlay_texture)
    }

    fn disasm_targets(&self) -> Vec<String> {
        self.capture.disasm_targets.clone()
    }

    fn disassemble(&self, shader: u64, _target: &str) -> ReplayResult<String> {
        Ok(self.capture.disasm.get(&shader).cloned().unwrap_or_default())
    }

    fn debug_pixel(&mut self, _x: u32, _y: u32, _sample: u32) -> ReplayResult<Option<TraceHandle>> {
        let source = self.pixel_trace.clone();
        Ok(self.start_trace(&source))
    }

    fn debug_vertex(
        &mut self,
        vtx: u64,
        instance: u64,
        idx: u64,
        view: u32,
    ) -> ReplayResult<Option<TraceHandle>> {
        *self.probe.vertex_debug_args.lock().unwrap() = Some((vtx, instance, idx, view));
        let source = self.vertex_trace.clone();
        Ok(self.start_trace(&source))
    }

    fn debug_thread(
        &mut self,
        _group: [u32; 3],
        _thread: [u32; 3],
    ) -> ReplayResult<Option<TraceHandle>> {
        let source = self.thread_trace.clone();
        Ok(self.start_trace(&source))
    }

    fn continue_debug(&mut self, trace: &TraceHandle) -> ReplayResult<Vec<TraceStep>> {
        if self.fail_continue_debug {
            return Err(ReplayError::Ffi("debugger fault".to_owned()));
        }
        match self.live_traces.get_mut(&trace.id) {
            Some(batches) => Ok(batches.pop_front().unwrap_or_default()),
            None => Err(ReplayError::Ffi("trace already freed".to_owned())),
        }
    }

    fn free_trace(&mut self, trace: TraceHandle) {
        self.live_traces.remove(&trace.id);
        self.probe
            .live_traces
            .store(self.live_traces.len() as u64, Ordering::SeqCst);
        self.probe.freed_traces.lock().unwrap().push(trace.id);
    }

    fn shader_encodings(&self) -> Vec<String> {
        self.capture.encodings.clone()
    }

    fn build_shader(
        &mut self,
        _stage: Stage,
        _source: &str,
        _encoding: &str,
        _entry: &str,
    ) -> ReplayResult<u64> {
        if let Some(msg) = &self.compile_error {
            return Err(ReplayError::Compile(msg.clone()));
        }
        let id = self.next_shader_id;
        self.next_shader_id += 1;
        self.built_shaders.push(id);
        Ok(id)
    }

    fn replace_resource(&mut self, original: u64, replacement: u64) -> ReplayResult<()> {
        self.replacements.insert(original, replacement);
        Ok(())
    }

    fn remove_replacement(&mut self, original: u64) -> ReplayResult<()> {
        self.replacements.remove(&original);
        Ok(())
    }

    fn free_custom_shader(&mut self, shader: u64) -> ReplayResult<()> {
        self.probe.freed_shaders.lock().unwrap().push(shader);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.probe.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Programmatic construction for tests.
#[derive(Debug)]
pub struct FixtureBuilder {
    replay: FixtureReplay,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self {
            replay: FixtureReplay::from_capture(FixtureCapture {
                disasm_targets: default_targets(),
                encodings: default_encodings(),
                api: default_api(),
                ..FixtureCapture::default()
            }),
        }
    }
}

impl FixtureBuilder {
    fn inner(&mut self) -> &mut FixtureReplay {
        &mut self.replay
    }

    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.inner().capture.actions = actions;
        self
    }

    pub fn resources(mut self, resources: Vec<ResourceDesc>) -> Self {
        self.inner().capture.resources = resources;
        self
    }

    pub fn textures(mut self, textures: Vec<TextureDesc>) -> Self {
        self.inner().capture.textures = textures;
        self
    }

    pub fn buffers(mut self, buffers: Vec<BufferDesc>) -> Self {
        self.inner().capture.buffers = buffers;
        self
    }

    pub fn chunks(mut self, chunks: Vec<ApiChunk>) -> Self {
        self.inner().capture.chunks = chunks;
        self
    }

    pub fn api(mut self, api: &str) -> Self {
        self.inner().capture.api = api.to_owned();
        self
    }

    pub fn capture_info(mut self, info: CaptureInfo) -> Self {
        self.inner().capture.capture_info = Some(info);
        self
    }

    pub fn snapshot(mut self, eid: u64, snap: PipeSnapshot) -> Self {
        self.inner().capture.snapshots.insert(eid, snap);
        self
    }

    pub fn default_snapshot(mut self, snap: PipeSnapshot) -> Self {
        self.inner().capture.default_snapshot = Some(snap);
        self
    }

    pub fn buffer_bytes(mut self, resource: u64, data: Vec<u8>) -> Self {
        self.inner().capture.buffer_data.insert(resource, data);
        self
    }

    pub fn texture_bytes(mut self, resource: u64, data: Vec<u8>) -> Self {
        self.inner().texture_data.insert(resource, data);
        self
    }

    pub fn usage(mut self, resource: u64, usage: Vec<EventUsage>) -> Self {
        self.inner().capture.usage.insert(resource, usage);
        self
    }

    pub fn disasm(mut self, shader: u64, text: &str) -> Self {
        self.inner().capture.disasm.insert(shader, text.to_owned());
        self
    }

    pub fn disasm_targets(mut self, targets: Vec<String>) -> Self {
        self.inner().capture.disasm_targets = targets;
        self
    }

    pub fn debug_messages(mut self, messages: Vec<DebugMessage>) -> Self {
        self.inner().capture.debug_messages = messages;
        self
    }

    pub fn counters(mut self, counters: Vec<CounterDesc>) -> Self {
        self.inner().capture.counters = counters;
        self
    }

    pub fn min_max(mut self, resource: u64, min: [f32; 4], max: [f32; 4]) -> Self {
        self.inner().min_max.insert(resource, (min, max));
        self
    }

    pub fn histogram(mut self, resource: u64, buckets: Vec<u64>) -> Self {
        self.inner().histograms.insert(resource, buckets);
        self
    }

    pub fn postvs(mut self, stage: MeshStage, mesh: MeshData) -> Self {
        self.inner().postvs.insert(stage, mesh);
        self
    }

    pub fn pixel_history(mut self, resource: u64, mods: Vec<PixelMod>) -> Self {
        self.inner().pixel_history.insert(resource, mods);
        self
    }

    pub fn overlay_texture(mut self, id: u64) -> Self {
        self.inner().overlay_texture = id;
        self
    }

    pub fn pixel_trace(mut self, trace: FixtureTrace) -> Self {
        self.inner().pixel_trace = Some(trace);
        self
    }

    pub fn vertex_trace(mut self, trace: FixtureTrace) -> Self {
        self.inner().vertex_trace = Some(trace);
        self
    }

    pub fn thread_trace(mut self, trace: FixtureTrace) -> Self {
        self.inner().thread_trace = Some(trace);
        self
    }

    pub fn compile_error(mut self, message: &str) -> Self {
        self.inner().compile_error = Some(message.to_owned());
        self
    }

    pub fn fail_texture_saves(mut self) -> Self {
        self.inner().fail_texture_saves = true;
        self
    }

    pub fn fail_continue_debug(mut self) -> Self {
        self.inner().fail_continue_debug = true;
        self
    }

    pub fn build(self) -> FixtureReplay {
        self.replay
    }
}

/// Opens `*.json` fixture captures.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOpener;

impl CaptureOpener for FixtureOpener {
    fn open_capture(&self, path: &Path) -> ReplayResult<Box<dyn ReplayControl + Send>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReplayError::Ffi(format!("{}: {e}", path.display())))?;
        let replay = FixtureReplay::from_json(&text)
            .map_err(|e| ReplayError::Ffi(format!("{}: {e}", path.display())))?;
        Ok(Box::new(replay))
    }
}
