//! Shader edit / replace: the compile-replay loop.
//!
//! Built shaders and active replacements are tracked in session state and
//! freed at shutdown. Replacing a shader invalidates both the seek cache
//! (the replay's state at the cached event changed) and the shader cache.

use serde_json::{json, Value};

use core_replay::Stage;
use core_rpc::RpcError;
use tracing::info;

use crate::params::Params;
use crate::state::DaemonState;

fn stage_param(p: &Params) -> Result<Stage, RpcError> {
    let name = p.opt_str("stage").unwrap_or("ps").to_ascii_lowercase();
    Stage::parse(&name).ok_or_else(|| RpcError::invalid_args("invalid stage"))
}

fn invalidate_after_edit(state: &mut DaemonState) {
    state.cursor.invalidate();
    state.shader_cache.invalidate();
}

pub fn shader_encodings(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let encodings = state.replay_ref()?.shader_encodings();
    Ok(json!({"encodings": encodings}))
}

pub fn shader_build(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage = stage_param(p)?;
    let source = p.require_str("source")?.to_owned();
    let encoding = p.opt_str("encoding").unwrap_or("glsl").to_owned();
    let entry = p.opt_str("entry").unwrap_or("main").to_owned();

    let known = state.replay_ref()?.shader_encodings();
    if !known.iter().any(|e| e.eq_ignore_ascii_case(&encoding)) {
        return Err(RpcError::invalid_args(format!("unknown encoding: {encoding}")));
    }

    let (replay, _) = state.replay_and_cursor()?;
    let shader = replay
        .build_shader(stage, &source, &encoding, &entry)
        .map_err(|e| RpcError::invalid_args(e.to_string()))?;
    state.built_shaders.push(shader);
    info!(target: "shader_edit", shader, stage = %stage, encoding = %encoding, "shader_built");
    Ok(json!({"shader": shader, "stage": stage.name(), "entry": entry}))
}

pub fn shader_replace(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let shader_id = p.require_u64("shader_id")?;
    let stage = stage_param(p)?;

    if !state.built_shaders.contains(&shader_id) {
        return Err(RpcError::not_found(format!("unknown shader {shader_id}")));
    }
    let (_, snap) = state.require_pipe(Some(eid))?;
    let original = snap.stage(stage).shader;
    if original == 0 {
        return Err(RpcError::not_found(format!(
            "no shader bound at stage {} for eid {eid}",
            stage.name()
        )));
    }

    let (replay, _) = state.replay_and_cursor()?;
    replay
        .replace_resource(original, shader_id)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    state.replaced_sites.insert((eid, stage), original);
    state.replacements.insert(original, shader_id);
    invalidate_after_edit(state);
    info!(target: "shader_edit", eid, stage = %stage, original, replacement = shader_id, "shader_replaced");
    Ok(json!({"ok": true, "original": original, "replacement": shader_id}))
}

pub fn shader_restore(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let stage = stage_param(p)?;

    let original = state
        .replaced_sites
        .remove(&(eid, stage))
        .ok_or_else(|| {
            RpcError::not_found(format!(
                "no replacement at eid {eid} stage {}",
                stage.name()
            ))
        })?;
    state.replacements.remove(&original);
    let (replay, _) = state.replay_and_cursor()?;
    replay
        .remove_replacement(original)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    invalidate_after_edit(state);
    Ok(json!({"ok": true, "original": original}))
}

pub fn shader_restore_all(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let originals: Vec<u64> = state.replacements.keys().copied().collect();
    let built: Vec<u64> = state.built_shaders.clone();
    let restored = originals.len();
    let freed = built.len();

    {
        let (replay, _) = state.replay_and_cursor()?;
        for orig in originals {
            let _ = replay.remove_replacement(orig);
        }
        for sid in built {
            let _ = replay.free_custom_shader(sid);
        }
    }
    state.replacements.clear();
    state.replaced_sites.clear();
    state.built_shaders.clear();
    if restored > 0 {
        invalidate_after_edit(state);
    }
    Ok(json!({"ok": true, "restored": restored, "freed": freed}))
}
