//! Texture handlers: info, PNG exports, raw dumps, render-target exports,
//! overlays and min/max/histogram stats.

use serde_json::{json, Value};

use core_replay::{Overlay, Subresource, TextureSave};
use core_rpc::{ErrorKind, RpcError};

use crate::params::Params;
use crate::state::DaemonState;

const OVERLAYS: [(&str, Overlay); 9] = [
    ("wireframe", Overlay::Wireframe),
    ("depth", Overlay::Depth),
    ("stencil", Overlay::Stencil),
    ("backface", Overlay::Backface),
    ("viewport", Overlay::Viewport),
    ("nan", Overlay::Nan),
    ("clipping", Overlay::Clipping),
    ("overdraw", Overlay::Overdraw),
    ("triangle-size", Overlay::TriangleSize),
];

fn export_failed() -> RpcError {
    RpcError::new(ErrorKind::DecodeFailed, "SaveTexture failed")
}

fn artifact(path: std::path::PathBuf) -> Result<Value, RpcError> {
    let size = std::fs::metadata(&path)
        .map_err(|_| export_failed())?
        .len();
    Ok(json!({"path": path.display().to_string(), "size": size}))
}

pub fn tex_info(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let id = p.u64_or("id", 0)?;
    let tex = state
        .tex_map
        .get(&id)
        .ok_or_else(|| RpcError::not_found(format!("texture {id} not found")))?;
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
        "type": tex.ty,
        "dimension": tex.dimension,
        "width": tex.width,
        "height": tex.height,
        "depth": tex.depth,
        "mips": tex.mips,
        "array_size": tex.array_size,
        "format": tex.format,
        "byte_size": tex.byte_size,
        "creation_flags": tex.creation_flags,
        "cubemap": tex.cubemap,
        "ms_samp": tex.ms_samp,
    }))
}

pub fn tex_export(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.u64_or("id", 0)?;
    let mip = p.u64_or("mip", 0)? as u32;
    let tex = state
        .tex_map
        .get(&id)
        .ok_or_else(|| RpcError::not_found(format!("texture {id} not found")))?;
    if mip >= tex.mips {
        return Err(RpcError::not_found(format!(
            "mip {mip} out of range (max: {})",
            tex.mips.saturating_sub(1)
        )));
    }
    let path = state.temp_path(&format!("tex_{id}_mip{mip}.png"))?;
    state
        .replay_ref()?
        .save_texture(
            TextureSave {
                resource: id,
                mip,
                slice: 0,
            },
            &path,
        )
        .map_err(|_| export_failed())?;
    artifact(path)
}

pub fn tex_raw(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.u64_or("id", 0)?;
    if !state.tex_map.contains_key(&id) {
        return Err(RpcError::not_found(format!("texture {id} not found")));
    }
    let data = state
        .replay_ref()?
        .texture_data(id, Subresource::default())
        .map_err(|e| RpcError::internal(e.to_string()))?;
    let path = state.temp_path(&format!("tex_{id}.raw"))?;
    std::fs::write(&path, &data).map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(json!({"path": path.display().to_string(), "size": data.len()}))
}

pub fn rt_export(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let target_idx = p.u64_or("target", 0)? as usize;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    let non_null: Vec<(usize, u64)> = snap
        .color_targets
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, t)| t != 0)
        .collect();
    if non_null.is_empty() {
        return Err(RpcError::not_found(format!("no color targets at eid {eid}")));
    }
    let target = non_null
        .iter()
        .find(|(i, _)| *i == target_idx)
        .map(|&(_, t)| t)
        .ok_or_else(|| RpcError::not_found(format!("target index {target_idx} out of range")))?;

    let path = state.temp_path(&format!("rt_{eid}_color{target_idx}.png"))?;
    state
        .replay_ref()?
        .save_texture(
            TextureSave {
                resource: target,
                mip: 0,
                slice: 0,
            },
            &path,
        )
        .map_err(|_| export_failed())?;
    artifact(path)
}

pub fn rt_depth(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;
    if snap.depth_target == 0 {
        return Err(RpcError::not_found(format!("no depth target at eid {eid}")));
    }
    let path = state.temp_path(&format!("rt_{eid}_depth.png"))?;
    state
        .replay_ref()?
        .save_texture(
            TextureSave {
                resource: snap.depth_target,
                mip: 0,
                slice: 0,
            },
            &path,
        )
        .map_err(|_| export_failed())?;
    artifact(path)
}

pub fn rt_overlay(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let overlay_name = p.opt_str("overlay").unwrap_or("").to_owned();
    let overlay = OVERLAYS
        .iter()
        .find(|(name, _)| *name == overlay_name)
        .map(|&(_, o)| o)
        .ok_or_else(|| {
            let valid: Vec<&str> = OVERLAYS.iter().map(|(n, _)| *n).collect();
            RpcError::invalid_args(format!(
                "unknown overlay '{overlay_name}'; valid: {}",
                valid.join(", ")
            ))
        })?;
    let width = p.u64_or("width", 256)? as u32;
    let height = p.u64_or("height", 256)? as u32;
    let (eid, snap) = state.require_pipe(p.opt_u64("eid")?)?;

    let target = snap
        .color_targets
        .iter()
        .copied()
        .find(|&t| t != 0)
        .ok_or_else(|| RpcError::not_found(format!("no color targets at eid {eid}")))?;

    let (replay, _) = state.replay_and_cursor()?;
    let overlay_tex = replay
        .render_overlay(target, overlay, width, height)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    if overlay_tex == 0 {
        return Err(RpcError::new(
            ErrorKind::DecodeFailed,
            "overlay texture ID is zero",
        ));
    }

    let path = state.temp_path(&format!("overlay_{overlay_name}_{eid}.png"))?;
    state
        .replay_ref()?
        .save_texture(
            TextureSave {
                resource: overlay_tex,
                mip: 0,
                slice: 0,
            },
            &path,
        )
        .map_err(|_| export_failed())?;
    let mut result = artifact(path)?;
    result["overlay"] = json!(overlay_name);
    result["eid"] = json!(eid);
    Ok(result)
}

pub fn tex_stats(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.u64_or("id", 0)?;
    let tex = state
        .tex_map
        .get(&id)
        .cloned()
        .ok_or_else(|| RpcError::not_found(format!("texture {id} not found")))?;
    if tex.ms_samp > 1 {
        return Err(RpcError::not_found(
            "MSAA textures not supported for tex-stats",
        ));
    }

    let eid = p.u64_or("eid", state.cursor.current())?;
    state.seek(eid)?;

    let mip = p.u64_or("mip", 0)? as u32;
    let slice = p.u64_or("slice", 0)? as u32;
    if mip >= tex.mips {
        return Err(RpcError::not_found(format!(
            "mip {mip} out of range (max: {})",
            tex.mips.saturating_sub(1)
        )));
    }
    if slice >= tex.array_size {
        return Err(RpcError::not_found(format!(
            "slice {slice} out of range (max: {})",
            tex.array_size.saturating_sub(1)
        )));
    }

    let sub = Subresource { mip, slice, sample: 0 };
    let replay = state.replay_ref()?;
    let (min_val, max_val) = replay
        .min_max(id, sub)
        .map_err(|e| RpcError::internal(e.to_string()))?;

    let channel_obj = |v: [f32; 4]| json!({"r": v[0], "g": v[1], "b": v[2], "a": v[3]});
    let mut result = json!({
        "id": id,
        "eid": eid,
        "mip": mip,
        "slice": slice,
        "min": channel_obj(min_val),
        "max": channel_obj(max_val),
    });

    if p.bool_or("histogram", false) {
        let mut histogram: Vec<Value> = Vec::new();
        for ch in 0..4usize {
            let min_f = min_val[ch];
            let mut max_f = max_val[ch];
            if min_f == max_f {
                max_f = min_f + 1.0;
            }
            let buckets = replay
                .histogram(id, sub, ch, (min_f, max_f))
                .map_err(|e| RpcError::internal(e.to_string()))?;
            let ch_name = ["r", "g", "b", "a"][ch];
            for (bucket, count) in buckets.iter().enumerate() {
                if ch == 0 {
                    histogram.push(json!({"bucket": bucket, "r": count, "g": 0, "b": 0, "a": 0}));
                } else if let Some(row) = histogram.get_mut(bucket) {
                    row[ch_name] = json!(count);
                }
            }
        }
        result["histogram"] = json!(histogram);
    }
    Ok(result)
}
