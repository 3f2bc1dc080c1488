//! Pipeline summary, per-stage shader rows, and merged binding rows.

use core_replay::{PipeSnapshot, Stage};
use serde_json::{json, Value};

/// The `pipeline` summary row. When `stage` is given, the row carries a
/// `section`/`section_detail` pair for that stage's shader identity.
pub fn pipeline_row(eid: u64, api: &str, snap: &PipeSnapshot, stage: Option<Stage>) -> Value {
    let mut row = serde_json::Map::new();
    row.insert("eid".into(), json!(eid));
    row.insert("api".into(), json!(api));
    row.insert("topology".into(), json!(snap.topology));
    row.insert("graphics_pipeline".into(), json!(snap.graphics_pipeline));
    row.insert("compute_pipeline".into(), json!(snap.compute_pipeline));
    if let Some(stage) = stage {
        row.insert("section".into(), json!(stage.name()));
        row.insert("section_detail".into(), shader_row(eid, snap, stage)["row"].clone());
    }
    Value::Object(row)
}

/// `{row: {eid, stage, shader, entry, ro, rw, cbuffers}}` for one stage.
pub fn shader_row(eid: u64, snap: &PipeSnapshot, stage: Stage) -> Value {
    let binding = snap.stage(stage);
    let (ro, rw, cbuffers) = match &binding.reflection {
        Some(refl) => (
            refl.ro_resources.len(),
            refl.rw_resources.len(),
            refl.constant_blocks.len(),
        ),
        None => (0, 0, 0),
    };
    json!({
        "row": {
            "eid": eid,
            "stage": stage.name(),
            "shader": binding.shader,
            "entry": binding.entry,
            "ro": ro,
            "rw": rw,
            "cbuffers": cbuffers,
        }
    })
}

/// One row per bound stage, used by `shader_all`.
pub fn stage_rows(snap: &PipeSnapshot) -> Vec<Value> {
    let mut rows = Vec::new();
    for stage in Stage::ALL {
        let binding = snap.stage(stage);
        if binding.shader == 0 {
            continue;
        }
        let (ro, rw, cbuffers) = match &binding.reflection {
            Some(refl) => (
                refl.ro_resources.len(),
                refl.rw_resources.len(),
                refl.constant_blocks.len(),
            ),
            None => (0, 0, 0),
        };
        rows.push(json!({
            "stage": stage.name(),
            "shader": binding.shader,
            "entry": binding.entry,
            "ro": ro,
            "rw": rw,
            "cbuffers": cbuffers,
        }));
    }
    rows
}

/// Merged binding rows over all six stages: read-only and read-write
/// resources, constant buffers, then samplers. `set` is the descriptor set /
/// register space, `slot` the binding number — they are distinct columns.
pub fn bindings_rows(eid: u64, snap: &PipeSnapshot) -> Vec<Value> {
    let mut rows = Vec::new();
    for stage in Stage::ALL {
        let binding = snap.stage(stage);
        if let Some(refl) = &binding.reflection {
            for r in &refl.ro_resources {
                rows.push(json!({
                    "eid": eid, "stage": stage.name(), "kind": "ro",
                    "set": r.set, "slot": r.slot, "name": r.name,
                }));
            }
            for r in &refl.rw_resources {
                rows.push(json!({
                    "eid": eid, "stage": stage.name(), "kind": "rw",
                    "set": r.set, "slot": r.slot, "name": r.name,
                }));
            }
            for cb in &refl.constant_blocks {
                rows.push(json!({
                    "eid": eid, "stage": stage.name(), "kind": "cbuffer",
                    "set": cb.set, "slot": cb.slot, "name": cb.name,
                }));
            }
        }
        for s in snap.samplers.iter().filter(|s| s.stage == stage) {
            rows.push(json!({
                "eid": eid, "stage": stage.name(), "kind": "sampler",
                "set": s.set, "slot": s.slot, "name": "",
            }));
        }
    }
    rows
}
