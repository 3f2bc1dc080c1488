//! Buffer handlers: info, raw dumps, and the decode family.

use serde_json::{json, Value};

use core_pipeline::{decode_ibuffer, decode_mesh, decode_vbuffers, flatten_cbuffer_vars};
use core_replay::{MeshStage, Stage, SIZE_SENTINEL};
use core_rpc::RpcError;

use crate::params::Params;
use crate::state::DaemonState;

pub fn buf_info(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let id = p.u64_or("id", 0)?;
    let buf = state
        .buf_map
        .get(&id)
        .ok_or_else(|| RpcError::not_found(format!("buffer {id} not found")))?;
    let name = state
        .replay_ref()?
        .resources()
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.name.clone())
        .unwrap_or_default();
    Ok(json!({
        "id": id,
        "name": name,
        "length": buf.length,
        "creation_flags": buf.creation_flags,
        "gpu_address": buf.gpu_address,
    }))
}

pub fn buf_raw(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.u64_or("id", 0)?;
    if !state.buf_map.contains_key(&id) {
        return Err(RpcError::not_found(format!("buffer {id} not found")));
    }
    let data = state
        .replay_ref()?
        .buffer_data(id, 0, 0)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    let path = state.temp_path(&format!("buf_{id}.bin"))?;
    std::fs::write(&path, &data).map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(json!({"path": path.display().to_string(), "size": data.len()}))
}

pub fn postvs(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.u64_or("eid", state.cursor.current())?;
    state.seek(eid)?;
    let mesh = state
        .replay_ref()?
        .postvs(MeshStage::VsOut)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(json!({
        "eid": eid,
        "vertexResourceId": mesh.vertex_resource,
        "vertexByteStride": mesh.vertex_byte_stride,
        "numIndices": mesh.num_indices,
        "topology": mesh.topology,
    }))
}

pub fn mesh_data(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let stage_name = p.opt_str("stage").unwrap_or("vs-out").to_owned();
    let stage = MeshStage::parse(&stage_name).ok_or_else(|| {
        RpcError::invalid_args(format!("invalid stage '{stage_name}'; use vs-out or gs-out"))
    })?;
    let eid = p.u64_or("eid", state.cursor.current())?;
    state.seek(eid)?;

    let replay = state.replay_ref()?;
    let mesh = replay
        .postvs(stage)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    if mesh.vertex_resource == 0 || mesh.vertex_byte_stride == 0 {
        return Err(RpcError::not_found("no PostVS data at this event"));
    }
    let vertex_raw = replay
        .buffer_data(mesh.vertex_resource, mesh.vertex_byte_offset, mesh.vertex_byte_size)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    let index_raw = if mesh.index_resource != 0 && mesh.index_byte_size > 0 {
        replay
            .buffer_data(mesh.index_resource, mesh.index_byte_offset, mesh.index_byte_size)
            .map_err(|e| RpcError::internal(e.to_string()))?
    } else {
        Vec::new()
    };
    Ok(decode_mesh(eid, &stage_name, &mesh, &vertex_raw, &index_raw))
}

pub fn cbuffer_decode(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let set = p.u64_or("set", 0)? as u32;
    let binding = p.u64_or("binding", 0)? as u32;
    let stage_name = p.opt_str("stage").unwrap_or("ps").to_ascii_lowercase();
    let stage = Stage::parse(&stage_name).ok_or_else(|| RpcError::invalid_args("invalid stage"))?;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;

    let refl = snap
        .stage(stage)
        .reflection
        .as_ref()
        .ok_or_else(|| RpcError::not_found(format!("no reflection for stage {stage_name}")))?;
    let block_idx = refl
        .constant_blocks
        .iter()
        .position(|cb| cb.set == set && cb.slot == binding)
        .ok_or_else(|| {
            RpcError::not_found(format!("no constant block at set={set} binding={binding}"))
        })?;

    let contents = state
        .replay_ref()?
        .cbuffer_contents(stage, block_idx)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(json!({
        "eid": eid,
        "set": set,
        "binding": binding,
        "variables": flatten_cbuffer_vars(&contents),
    }))
}

pub fn vbuffer_decode(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let count = p.opt_u64("count")?.map(|v| v as usize);
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;

    let replay = state.replay_ref()?;
    let mut buffer_bytes: Vec<Vec<u8>> = Vec::with_capacity(snap.vbuffers.len());
    for vb in &snap.vbuffers {
        if vb.resource == 0 {
            buffer_bytes.push(Vec::new());
            continue;
        }
        let len = if vb.byte_size >= SIZE_SENTINEL { 0 } else { vb.byte_size };
        let data = replay
            .buffer_data(vb.resource, vb.byte_offset, len)
            .map_err(|e| RpcError::internal(e.to_string()))?;
        buffer_bytes.push(data);
    }
    Ok(decode_vbuffers(eid, &snap, &buffer_bytes, count))
}

pub fn ibuffer_decode(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    if snap.ibuffer.resource == 0 {
        return Ok(json!({"eid": eid, "format": "none", "indices": []}));
    }
    let len = if snap.ibuffer.byte_size >= SIZE_SENTINEL {
        0
    } else {
        snap.ibuffer.byte_size
    };
    let data = state
        .replay_ref()?
        .buffer_data(snap.ibuffer.resource, snap.ibuffer.byte_offset, len)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(decode_ibuffer(eid, &snap, &data))
}
