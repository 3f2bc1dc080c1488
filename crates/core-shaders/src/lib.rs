//! Single-walk shader cache.
//!
//! One depth-first pass over the frame's draws and dispatches collects, per
//! event, the six bound shader ids, and per unique shader its disassembly
//! and metadata. The walk seeks through the whole frame, so it funnels every
//! move through the shared [`Cursor`]: at most one FFI seek per unique event
//! id, and a rebuild after the sentinel is set performs zero seeks.
//!
//! After the cache is built it is read-only until a shader replacement
//! invalidates it.

use ahash::AHashMap;
use tracing::{debug, info};

use core_model::is_work;
use core_replay::{Cursor, ReplayControl, SeekError, Stage};

#[derive(Debug, Clone, Default)]
pub struct ShaderMeta {
    /// Stages this shader was seen bound to, in discovery order.
    pub stages: Vec<Stage>,
    /// Number of draw/dispatch events that bound it.
    pub uses: u64,
    pub first_eid: u64,
    pub entry: String,
    pub inputs: usize,
    pub outputs: usize,
}

#[derive(Debug, Default)]
pub struct ShaderCache {
    /// Disassembly text per shader resource id.
    pub disasm: AHashMap<u64, String>,
    pub meta: AHashMap<u64, ShaderMeta>,
    /// Per-event snapshot of the six stage shader ids, draw/dispatch events
    /// only.
    pub stage_map: AHashMap<u64, [u64; 6]>,
    built: bool,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Drop everything; the next build walks the frame again. Needed after a
    /// shader replacement changes what the replay reports as bound.
    pub fn invalidate(&mut self) {
        self.disasm.clear();
        self.meta.clear();
        self.stage_map.clear();
        self.built = false;
    }

    /// Build the cache in one walk. Idempotent: a second call is a no-op and
    /// performs no seeks. Restores the user's cursor position on completion.
    pub fn build(
        &mut self,
        replay: &mut (dyn ReplayControl + Send),
        cursor: &mut Cursor,
    ) -> Result<(), SeekError> {
        if self.built {
            return Ok(());
        }
        let user_eid = cursor.current();
        let target = replay
            .disasm_targets()
            .into_iter()
            .next()
            .unwrap_or_else(|| "SPIR-V".to_owned());

        let mut work_eids = Vec::new();
        collect_work_eids(replay.root_actions(), &mut work_eids);

        let mut first_seen: Vec<u64> = Vec::new();
        for eid in work_eids {
            cursor.seek(&mut *replay, eid)?;
            let snap = replay.pipe_snapshot();

            let mut ids = [0u64; 6];
            for stage in Stage::ALL {
                ids[stage.index()] = snap.stage(stage).shader;
            }
            self.stage_map.insert(eid, ids);

            for stage in Stage::ALL {
                let binding = snap.stage(stage);
                if binding.shader == 0 {
                    continue;
                }
                let meta = self.meta.entry(binding.shader).or_insert_with(|| {
                    first_seen.push(binding.shader);
                    let entry = if binding.entry.is_empty() {
                        binding
                            .reflection
                            .as_ref()
                            .map(|r| r.entry_point.clone())
                            .filter(|e| !e.is_empty())
                            .unwrap_or_else(|| "main".to_owned())
                    } else {
                        binding.entry.clone()
                    };
                    ShaderMeta {
                        stages: Vec::new(),
                        uses: 0,
                        first_eid: eid,
                        entry,
                        inputs: binding
                            .reflection
                            .as_ref()
                            .map(|r| r.ro_resources.len())
                            .unwrap_or(0),
                        outputs: binding
                            .reflection
                            .as_ref()
                            .map(|r| r.rw_resources.len())
                            .unwrap_or(0),
                    }
                });
                if !meta.stages.contains(&stage) {
                    meta.stages.push(stage);
                }
                meta.uses += 1;
            }

            // Disassemble each shader once, at its first sighting, while the
            // cursor is at an event that binds it.
            for stage in Stage::ALL {
                let binding = snap.stage(stage);
                if binding.shader == 0 || self.disasm.contains_key(&binding.shader) {
                    continue;
                }
                let text = match &binding.reflection {
                    Some(_) => replay
                        .disassemble(binding.shader, &target)
                        .unwrap_or_default(),
                    None => String::new(),
                };
                debug!(target: "shader_cache", shader = binding.shader, stage = %stage, "disassembled");
                self.disasm.insert(binding.shader, text);
            }
        }

        self.built = true;
        cursor.restore_to(&mut *replay, user_eid)?;
        info!(
            target: "shader_cache",
            shaders = self.disasm.len(),
            events = self.stage_map.len(),
            "cache_built"
        );
        Ok(())
    }
}

fn collect_work_eids(actions: &[core_replay::Action], out: &mut Vec<u64>) {
    for a in actions {
        if is_work(a.flags) {
            out.push(a.eid);
        }
        collect_work_eids(&a.children, out);
    }
}
