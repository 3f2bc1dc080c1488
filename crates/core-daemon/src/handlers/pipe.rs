//! Pipeline state handlers: the thirteen `pipe_*` sections, the `pipeline`
//! summary with section routing, bindings, and descriptors.

use serde_json::{json, Value};

use core_pipeline::{bindings_rows, pipeline_row, section_row, Section};
use core_replay::Stage;
use core_rpc::RpcError;

use crate::params::Params;
use crate::state::DaemonState;

pub fn pipe_section(section: Section, p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    Ok(section_row(section, eid, &snap))
}

pub fn pipeline(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    // A section argument may name a fixed-function section (delegated to its
    // pipe_* handler) or a shader stage (summary row with stage detail).
    let section = p.opt_str("section").map(|s| s.to_ascii_lowercase());
    let stage = section.as_deref().and_then(Stage::parse);
    let fixed = section.as_deref().and_then(Section::parse);
    if section.is_some() && stage.is_none() && fixed.is_none() {
        return Err(RpcError::invalid_args("invalid section"));
    }

    if let Some(fixed) = fixed {
        return pipe_section(fixed, p, state);
    }

    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let row = pipeline_row(eid, &state.api_name, &snap, stage);
    Ok(json!({"row": row}))
}

pub fn bindings(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let mut rows = bindings_rows(eid, &snap);

    if let Some(set) = p.opt_u64("set")? {
        rows.retain(|r| r["set"].as_u64() == Some(set));
    }
    if let Some(binding) = p.opt_u64("binding")? {
        rows.retain(|r| r["slot"].as_u64() == Some(binding));
    }
    Ok(json!({"rows": rows}))
}

/// Flattened descriptor view: one row per resource binding visible to any
/// stage at this event, with the actually bound resource behind each.
pub fn descriptors(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (_eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let format_cell = |format: &str| -> Value {
        if format.is_empty() {
            json!("-")
        } else {
            json!(format)
        }
    };

    let mut rows: Vec<Value> = Vec::new();
    for stage in Stage::ALL {
        let binding = snap.stage(stage);
        let Some(refl) = &binding.reflection else {
            continue;
        };
        for (kind, resources, bound) in [
            ("ro", &refl.ro_resources, &binding.ro_bindings),
            ("rw", &refl.rw_resources, &binding.rw_bindings),
        ] {
            for (index, r) in resources.iter().enumerate() {
                let desc = bound.get(index).cloned().unwrap_or_default();
                rows.push(json!({
                    "stage": stage.name(),
                    "type": kind,
                    "index": index,
                    "array_element": 0,
                    "resource_id": desc.resource,
                    "format": format_cell(&desc.format),
                    "byte_size": desc.byte_size,
                    "set": r.set,
                    "slot": r.slot,
                    "name": r.name,
                }));
            }
        }
        for (index, cb) in refl.constant_blocks.iter().enumerate() {
            let desc = binding.cbuffer_bindings.get(index).cloned().unwrap_or_default();
            // The bound range wins; the declared block size is the fallback
            // when the replay reports a whole-buffer binding.
            let byte_size = if desc.byte_size != 0 {
                desc.byte_size
            } else {
                cb.byte_size
            };
            rows.push(json!({
                "stage": stage.name(),
                "type": "cbuffer",
                "index": index,
                "array_element": 0,
                "resource_id": desc.resource,
                "format": format_cell(&desc.format),
                "byte_size": byte_size,
                "set": cb.set,
                "slot": cb.slot,
                "name": cb.name,
            }));
        }
    }
    Ok(json!({"descriptors": rows}))
}
