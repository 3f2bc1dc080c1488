//! Session state.
//!
//! One value of [`DaemonState`] is owned by the session loop; handlers
//! receive `&mut` and are never reentrant. The cursor and every cache in
//! here rely on that serialization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing::{info, warn};

use core_model::{build_pass_list, flatten_actions, max_eid, FlatAction, PassInfo};
use core_replay::{
    BufferDesc, CaptureOpener, Cursor, EventUsage, PipeSnapshot, ReplayControl, SeekError, Stage,
    TextureDesc,
};
use core_rpc::{ErrorKind, RpcError};
use core_shaders::ShaderCache;
use core_vfs::{build_vfs_skeleton, populate_shaders_subtree, VfsTree};

pub struct DaemonState {
    pub capture: String,
    pub token: String,
    pub api_name: String,
    pub opener: Option<Box<dyn CaptureOpener>>,
    pub replay: Option<Box<dyn ReplayControl + Send>>,
    pub cursor: Cursor,
    pub passes: Vec<PassInfo>,
    pub tex_map: AHashMap<u64, TextureDesc>,
    pub buf_map: AHashMap<u64, BufferDesc>,
    pub vfs: Option<VfsTree>,
    pub shader_cache: ShaderCache,
    /// Populated on the first `log` query and never refreshed.
    pub debug_messages_cache: Option<Vec<core_replay::DebugMessage>>,
    pub temp_dir: Option<TempDir>,
    /// Shader ids produced by `shader_build`, freed at shutdown.
    pub built_shaders: Vec<u64>,
    /// (eid, stage) → original shader id currently replaced there.
    pub replaced_sites: AHashMap<(u64, Stage), u64>,
    /// original → replacement shader id.
    pub replacements: AHashMap<u64, u64>,
    pub subtree_capacity: usize,
}

impl DaemonState {
    pub fn new(capture: &str, token: &str) -> Self {
        Self {
            capture: capture.to_owned(),
            token: token.to_owned(),
            api_name: String::new(),
            opener: None,
            replay: None,
            cursor: Cursor::new(0),
            passes: Vec::new(),
            tex_map: AHashMap::new(),
            buf_map: AHashMap::new(),
            vfs: None,
            shader_cache: ShaderCache::new(),
            debug_messages_cache: None,
            temp_dir: None,
            built_shaders: Vec::new(),
            replaced_sites: AHashMap::new(),
            replacements: AHashMap::new(),
            subtree_capacity: 16,
        }
    }

    /// Bind an opened replay: derive the pass/resource tables, the VFS
    /// skeleton, and the session temp directory.
    pub fn attach_replay(&mut self, replay: Box<dyn ReplayControl + Send>) -> Result<(), RpcError> {
        self.api_name = replay.api_properties().api;
        self.cursor = Cursor::new(max_eid(replay.root_actions()));
        self.passes = build_pass_list(replay.root_actions());

        self.tex_map = replay
            .textures()
            .iter()
            .map(|t| (t.resource, t.clone()))
            .collect();
        self.buf_map = replay
            .buffers()
            .iter()
            .map(|b| (b.resource, b.clone()))
            .collect();

        let tex_ids: Vec<u64> = replay.textures().iter().map(|t| t.resource).collect();
        let buf_ids: Vec<u64> = replay.buffers().iter().map(|b| b.resource).collect();
        self.vfs = Some(build_vfs_skeleton(
            replay.root_actions(),
            replay.resources(),
            &tex_ids,
            &buf_ids,
            self.subtree_capacity,
        ));

        self.temp_dir = Some(
            tempfile::Builder::new()
                .prefix("rdcap-session-")
                .tempdir()
                .map_err(|e| RpcError::internal(format!("temp dir: {e}")))?,
        );

        info!(
            target: "daemon",
            capture = %self.capture,
            api = %self.api_name,
            max_eid = self.cursor.max_eid(),
            passes = self.passes.len(),
            "replay_attached"
        );
        self.replay = Some(replay);
        Ok(())
    }

    /// Open a capture through the configured opener.
    pub fn open_capture(&mut self, path: &Path) -> Result<(), RpcError> {
        let opener = self
            .opener
            .as_ref()
            .ok_or_else(|| RpcError::new(ErrorKind::NoReplay, "no capture opener configured"))?;
        let replay = opener
            .open_capture(path)
            .map_err(|e| RpcError::internal(e.to_string()))?;
        self.capture = path.display().to_string();
        self.attach_replay(replay)
    }

    // --- accessors used by every handler ---------------------------------

    pub fn replay_and_cursor(
        &mut self,
    ) -> Result<(&mut Box<dyn ReplayControl + Send>, &mut Cursor), RpcError> {
        let DaemonState { replay, cursor, .. } = self;
        match replay {
            Some(replay) => Ok((replay, cursor)),
            None => Err(RpcError::no_replay()),
        }
    }

    pub fn replay_ref(&self) -> Result<&(dyn ReplayControl + Send), RpcError> {
        self.replay
            .as_deref()
            .ok_or_else(RpcError::no_replay)
    }

    pub fn temp_path(&self, file_name: &str) -> Result<PathBuf, RpcError> {
        let dir = self
            .temp_dir
            .as_ref()
            .ok_or_else(|| RpcError::new(ErrorKind::NoReplay, "temp directory not available"))?;
        Ok(dir.path().join(file_name))
    }

    pub fn seek(&mut self, eid: u64) -> Result<(), RpcError> {
        let (replay, cursor) = self.replay_and_cursor()?;
        cursor.seek(&mut **replay, eid).map_err(seek_error)
    }

    pub fn restore_cursor(&mut self, eid: u64) {
        if let Ok((replay, cursor)) = self.replay_and_cursor() {
            if let Err(e) = cursor.restore_to(&mut **replay, eid) {
                warn!(target: "daemon", error = %e, "cursor_restore_failed");
            }
        }
    }

    /// Seek and snapshot: the common prefix of every pipeline-ish handler.
    pub fn require_pipe(&mut self, eid: Option<u64>) -> Result<(u64, PipeSnapshot), RpcError> {
        let eid = eid.unwrap_or(self.cursor.current());
        self.seek(eid)?;
        let snap = self.replay_ref()?.pipe_snapshot();
        Ok((eid, snap))
    }

    /// Build the shader cache (no-op when built) and mirror it into the
    /// `/shaders` subtree.
    pub fn ensure_shader_cache(&mut self) -> Result<(), RpcError> {
        if self.shader_cache.is_built() {
            return Ok(());
        }
        {
            let DaemonState {
                replay,
                cursor,
                shader_cache,
                ..
            } = self;
            let replay = replay.as_mut().ok_or_else(RpcError::no_replay)?;
            shader_cache
                .build(&mut **replay, cursor)
                .map_err(seek_error)?;
        }
        let shader_ids: Vec<u64> = self.shader_cache.meta.keys().copied().collect();
        if let Some(vfs) = self.vfs.as_mut() {
            populate_shaders_subtree(vfs, &shader_ids);
        }
        Ok(())
    }

    pub fn flat_actions(&self) -> Vec<FlatAction> {
        match self.replay.as_deref() {
            Some(replay) => flatten_actions(replay.root_actions(), &self.passes),
            None => Vec::new(),
        }
    }

    /// Ordered usage histories for the whole resource table.
    pub fn usage_map(&self) -> Result<BTreeMap<u64, Vec<EventUsage>>, RpcError> {
        let replay = self.replay_ref()?;
        Ok(replay
            .resources()
            .iter()
            .map(|r| (r.id, replay.usage(r.id)))
            .collect())
    }

    /// Free replacements and built shaders, close the replay, drop the temp
    /// directory. Safe to call on empty state.
    pub fn shutdown(&mut self) {
        if let Some(replay) = self.replay.as_mut() {
            for (&orig, _) in self.replacements.clone().iter() {
                let _ = replay.remove_replacement(orig);
            }
            for &sid in &self.built_shaders {
                let _ = replay.free_custom_shader(sid);
            }
            replay.shutdown();
        }
        self.replacements.clear();
        self.replaced_sites.clear();
        self.built_shaders.clear();
        if let Some(dir) = self.temp_dir.take() {
            if let Err(e) = dir.close() {
                warn!(target: "daemon", error = %e, "temp_dir_cleanup_failed");
            }
        }
        info!(target: "daemon", capture = %self.capture, "session_closed");
    }
}

pub fn seek_error(err: SeekError) -> RpcError {
    match err {
        SeekError::OutOfRange { .. } => RpcError::new(ErrorKind::OutOfRange, err.to_string()),
        SeekError::Replay(e) => RpcError::internal(e.to_string()),
    }
}

/// Resource rows in id order.
pub fn resource_rows(replay: &(dyn ReplayControl + Send)) -> Vec<Value> {
    let mut rows: Vec<Value> = replay
        .resources()
        .iter()
        .map(|r| json!({"id": r.id, "type": r.ty, "name": r.name}))
        .collect();
    rows.sort_by_key(|r| r["id"].as_u64().unwrap_or(0));
    rows
}
