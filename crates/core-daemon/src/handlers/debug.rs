//! Shader debugging: pixel, vertex and compute-thread traces.
//!
//! The trace handle is invalidated by `free_trace`, so the stage is read
//! out of the handle before the step loop and the free runs on every exit
//! path, including a mid-trace replay failure.

use serde_json::{json, Value};

use core_model::{find_action, ActionKind};
use core_replay::{ReplayControl, TraceHandle, TraceStep, VarData};
use core_rpc::RpcError;

use crate::params::Params;
use crate::state::DaemonState;

fn var_data_json(data: &VarData) -> Value {
    match data {
        VarData::Float(v) => json!(v),
        VarData::UInt(v) => json!(v),
        VarData::SInt(v) => json!(v),
    }
}

fn change_json(c: &core_replay::VarChange) -> Value {
    json!({
        "name": c.name,
        "type": c.ty,
        "rows": c.rows,
        "cols": c.cols,
        "before": var_data_json(&c.before),
        "after": var_data_json(&c.after),
    })
}

/// Drain the trace into step records. The handle is freed before this
/// returns, success or not.
fn collect_trace(
    replay: &mut (dyn ReplayControl + Send),
    trace: TraceHandle,
    eid: u64,
) -> Result<Value, RpcError> {
    let stage = trace.stage;

    let drained: Result<Vec<TraceStep>, RpcError> = (|| {
        let mut steps = Vec::new();
        loop {
            let batch = replay
                .continue_debug(&trace)
                .map_err(|e| RpcError::internal(e.to_string()))?;
            if batch.is_empty() {
                break;
            }
            steps.extend(batch);
        }
        Ok(steps)
    })();
    replay.free_trace(trace);
    let steps = drained?;

    let rows: Vec<Value> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "step": i,
                "instruction": s.instruction,
                "file": s.file,
                "line": s.line,
                "changes": s.changes.iter().map(change_json).collect::<Vec<Value>>(),
            })
        })
        .collect();
    let inputs: Vec<Value> = steps
        .first()
        .map(|s| s.changes.iter().map(change_json).collect())
        .unwrap_or_default();
    let outputs: Vec<Value> = steps
        .last()
        .map(|s| s.changes.iter().map(change_json).collect())
        .unwrap_or_default();

    Ok(json!({
        "eid": eid,
        "stage": stage.name(),
        "total_steps": steps.len(),
        "trace": rows,
        "inputs": inputs,
        "outputs": outputs,
    }))
}

pub fn debug_pixel(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let x = p.require_u64("x")? as u32;
    let y = p.require_u64("y")? as u32;
    let sample = p.u64_or("sample", 0)? as u32;

    state.seek(eid)?;
    let (replay, _) = state.replay_and_cursor()?;
    let trace = replay
        .debug_pixel(x, y, sample)
        .map_err(|e| RpcError::internal(e.to_string()))?
        .ok_or_else(|| RpcError::debug_unavailable("no fragment to debug at this pixel"))?;
    collect_trace(&mut **replay, trace, eid)
}

pub fn debug_vertex(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let vtx = p.require_u64("vtx_id")?;
    let instance = p.u64_or("instance", 0)?;
    // Non-indexed draws feed the vertex id as the index value.
    let idx = p.u64_or("idx", vtx)?;
    let view = p.u64_or("view", 0)? as u32;

    state.seek(eid)?;
    let (replay, _) = state.replay_and_cursor()?;
    let trace = replay
        .debug_vertex(vtx, instance, idx, view)
        .map_err(|e| RpcError::internal(e.to_string()))?
        .ok_or_else(|| RpcError::debug_unavailable("vertex debug not available"))?;
    collect_trace(&mut **replay, trace, eid)
}

pub fn debug_thread(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let group = [
        p.require_u64("gx")? as u32,
        p.require_u64("gy")? as u32,
        p.require_u64("gz")? as u32,
    ];
    let thread = [
        p.require_u64("tx")? as u32,
        p.require_u64("ty")? as u32,
        p.require_u64("tz")? as u32,
    ];

    {
        let replay = state.replay_ref()?;
        let action = find_action(replay.root_actions(), eid);
        let is_dispatch = action
            .map(|a| ActionKind::of(a.flags) == ActionKind::Dispatch)
            .unwrap_or(false);
        if !is_dispatch {
            return Err(RpcError::invalid_args(format!(
                "eid {eid} is not a dispatch"
            )));
        }
    }

    state.seek(eid)?;
    let (replay, _) = state.replay_and_cursor()?;
    let trace = replay
        .debug_thread(group, thread)
        .map_err(|e| RpcError::internal(e.to_string()))?
        .ok_or_else(|| RpcError::debug_unavailable("no thread to debug"))?;
    collect_trace(&mut **replay, trace, eid)
}
