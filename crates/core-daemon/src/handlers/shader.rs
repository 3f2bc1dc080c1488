//! Shader handlers: per-stage queries at an event plus the cached
//! per-shader-id views.

use serde_json::{json, Value};

use core_pipeline::{flatten_cbuffer_vars, shader_row, stage_rows};
use core_replay::Stage;
use core_rpc::RpcError;

use crate::params::Params;
use crate::state::DaemonState;

fn stage_param(p: &Params) -> Result<Stage, RpcError> {
    let name = p.opt_str("stage").unwrap_or("ps").to_ascii_lowercase();
    Stage::parse(&name).ok_or_else(|| RpcError::invalid_args("invalid stage"))
}

fn default_target(state: &DaemonState) -> Result<String, RpcError> {
    Ok(state
        .replay_ref()?
        .disasm_targets()
        .into_iter()
        .next()
        .unwrap_or_else(|| "SPIR-V".to_owned()))
}

pub fn shader(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    Ok(shader_row(eid, &snap, stage))
}

pub fn shaders(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.ensure_shader_cache()?;
    let stage_filter = p.opt_str("stage").map(|s| s.to_ascii_lowercase());

    let mut ids: Vec<u64> = state.shader_cache.meta.keys().copied().collect();
    ids.sort_unstable();

    let mut rows: Vec<Value> = Vec::new();
    for sid in ids {
        let meta = &state.shader_cache.meta[&sid];
        let mut stages: Vec<&str> = meta.stages.iter().map(|s| s.name()).collect();
        stages.sort_unstable();
        if let Some(filter) = &stage_filter {
            if !stages.iter().any(|s| s == filter) {
                continue;
            }
        }
        rows.push(json!({
            "shader": sid,
            "stages": stages.join(","),
            "uses": meta.uses,
        }));
    }
    if p.opt_str("sort") == Some("uses") {
        rows.sort_by_key(|r| std::cmp::Reverse(r["uses"].as_u64().unwrap_or(0)));
    }
    Ok(json!({"rows": rows}))
}

pub fn shader_targets(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let targets = state.replay_ref()?.disasm_targets();
    Ok(json!({"targets": targets}))
}

pub fn shader_reflect(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let refl = snap
        .stage(stage)
        .reflection
        .as_ref()
        .ok_or_else(|| RpcError::not_found("no reflection available"))?;

    let signature = |params: &[core_replay::SigParam]| -> Vec<Value> {
        params
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "semantic": s.semantic,
                    "location": s.location,
                    "component": s.comp_count,
                    "type": s.comp_type,
                })
            })
            .collect()
    };
    let blocks: Vec<Value> = refl
        .constant_blocks
        .iter()
        .map(|cb| {
            json!({
                "name": cb.name,
                "bind_point": cb.slot,
                "size": cb.byte_size,
                "variables": cb.variables.len(),
            })
        })
        .collect();

    Ok(json!({
        "eid": eid,
        "stage": stage.name(),
        "input_sig": signature(&refl.input_signature),
        "output_sig": signature(&refl.output_signature),
        "constant_blocks": blocks,
    }))
}

pub fn shader_constants(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let refl = snap
        .stage(stage)
        .reflection
        .as_ref()
        .ok_or_else(|| RpcError::not_found("no reflection available"))?;

    let mut constants: Vec<Value> = Vec::new();
    for (idx, block) in refl.constant_blocks.iter().enumerate() {
        let contents = state
            .replay_ref()?
            .cbuffer_contents(stage, idx)
            .map_err(|e| RpcError::internal(e.to_string()))?;
        constants.push(json!({
            "name": block.name,
            "bind_point": block.slot,
            "variables": flatten_cbuffer_vars(&contents),
        }));
    }
    Ok(json!({"eid": eid, "stage": stage.name(), "constants": constants}))
}

pub fn shader_source(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;

    let mut source = String::new();
    let mut files: Vec<Value> = Vec::new();
    let mut has_debug_info = false;

    if let Some(refl) = &snap.stage(stage).reflection {
        if !refl.debug_files.is_empty() {
            has_debug_info = true;
            files = refl
                .debug_files
                .iter()
                .map(|f| json!({"filename": f.filename, "source": f.contents}))
                .collect();
        } else {
            let target = default_target(state)?;
            source = state
                .replay_ref()?
                .disassemble(snap.stage(stage).shader, &target)
                .map_err(|e| RpcError::internal(e.to_string()))?;
        }
    }

    Ok(json!({
        "eid": eid,
        "stage": stage.name(),
        "has_debug_info": has_debug_info,
        "files": files,
        "source": source,
    }))
}

pub fn shader_disasm(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let requested_target = p.opt_str("target").unwrap_or("").to_owned();
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;

    let mut disasm = String::new();
    let mut used_target = requested_target;
    if snap.stage(stage).reflection.is_some() {
        if used_target.is_empty() {
            used_target = default_target(state)?;
        }
        disasm = state
            .replay_ref()?
            .disassemble(snap.stage(stage).shader, &used_target)
            .map_err(|e| RpcError::internal(e.to_string()))?;
    }

    Ok(json!({
        "eid": eid,
        "stage": stage.name(),
        "target": used_target,
        "disasm": disasm,
    }))
}

pub fn shader_all(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    Ok(json!({"eid": eid, "stages": stage_rows(&snap)}))
}

pub fn shader_list_info(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.ensure_shader_cache()?;
    let sid = p.u64_or("id", 0)?;
    let meta = state
        .shader_cache
        .meta
        .get(&sid)
        .ok_or_else(|| RpcError::not_found(format!("shader {sid} not found")))?;
    let stages: Vec<&str> = meta.stages.iter().map(|s| s.name()).collect();
    Ok(json!({
        "id": sid,
        "stages": stages,
        "uses": meta.uses,
        "first_eid": meta.first_eid,
        "entry": meta.entry,
        "inputs": meta.inputs,
        "outputs": meta.outputs,
    }))
}

pub fn shader_list_disasm(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.ensure_shader_cache()?;
    let sid = p.u64_or("id", 0)?;
    let disasm = state
        .shader_cache
        .disasm
        .get(&sid)
        .ok_or_else(|| RpcError::not_found(format!("shader {sid} not found")))?;
    Ok(json!({"id": sid, "disasm": disasm}))
}
