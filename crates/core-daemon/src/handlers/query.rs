//! Frame-level queries: info, stats, log, events, draws, passes,
//! resources, counts, search, shader map.

use serde_json::{json, Map, Value};

use core_model::{count_from_actions, find_action, find_pass, ActionKind, FlatAction};
use core_queries::{aggregate_totals, build_pass_deps, search_disasm, shader_map_rows, top_draws, SearchOptions};
use core_replay::Stage;
use core_rpc::{ErrorKind, RpcError};

use crate::params::Params;
use crate::state::{resource_rows, DaemonState};

const LOG_LEVELS: [&str; 5] = ["HIGH", "MEDIUM", "LOW", "INFO", "UNKNOWN"];

fn severity_name(severity: u32) -> &'static str {
    match severity {
        0 => "HIGH",
        1 => "MEDIUM",
        2 => "LOW",
        3 => "INFO",
        _ => "UNKNOWN",
    }
}

pub fn ping(_p: &Params, _state: &mut DaemonState) -> Result<Value, RpcError> {
    Ok(json!({"pong": true}))
}

pub fn open_capture(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let path = p.require_str("path")?;
    state.open_capture(std::path::Path::new(path))?;
    Ok(json!({"ok": true, "capture": state.capture, "api": state.api_name}))
}

pub fn info(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let replay = state.replay_ref()?;
    let capture_info = replay.capture_info();
    let flat = state.flat_actions();
    let totals = aggregate_totals(&flat);

    let mut result = Map::new();
    result.insert("Capture".into(), json!(state.capture));
    result.insert("API".into(), json!(state.api_name));
    result.insert("Events".into(), json!(flat.len()));
    result.insert(
        "Draw Calls".into(),
        json!(format!(
            "{} ({} indexed, {} non-indexed, {} dispatches)",
            totals.total_draws, totals.indexed_draws, totals.non_indexed_draws, totals.dispatches
        )),
    );
    result.insert("Clears".into(), json!(totals.clears));
    result.insert("Copies".into(), json!(totals.copies));
    if let Some(ci) = capture_info {
        result.insert("has_callstacks".into(), json!(ci.has_callstacks));
        result.insert("machine_ident".into(), json!(ci.machine_ident));
        result.insert("timestamp_base".into(), json!(ci.timestamp_base));
    }
    Ok(Value::Object(result))
}

pub fn stats(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let user_eid = state.cursor.current();
    let flat = state.flat_actions();

    // Representative draw per pass for render-target enrichment.
    let mut pass_first_draw: Vec<(String, u64)> = Vec::new();
    for a in &flat {
        if a.kind().is_draw()
            && !a.pass_name.is_empty()
            && !pass_first_draw.iter().any(|(name, _)| *name == a.pass_name)
        {
            pass_first_draw.push((a.pass_name.clone(), a.eid));
        }
    }

    let mut per_pass: Vec<Value> = Vec::new();
    for pass in state.passes.clone() {
        let mut rt_w: Option<u32> = None;
        let mut rt_h: Option<u32> = None;
        let mut attachments = 0u64;
        let draw_eid = pass_first_draw
            .iter()
            .find(|(name, _)| *name == pass.name)
            .map(|(_, eid)| *eid);
        if let Some(eid) = draw_eid {
            if state.seek(eid).is_ok() {
                let snap = state.replay_ref()?.pipe_snapshot();
                let non_null: Vec<u64> = snap
                    .color_targets
                    .iter()
                    .copied()
                    .filter(|&t| t != 0)
                    .collect();
                attachments = non_null.len() as u64;
                if snap.depth_target != 0 {
                    attachments += 1;
                }
                if let Some(&first) = non_null.first() {
                    if let Some(tex) = state.tex_map.get(&first) {
                        rt_w = Some(tex.width);
                        rt_h = Some(tex.height);
                    }
                }
            }
        }
        per_pass.push(json!({
            "name": pass.name,
            "draws": pass.draws,
            "dispatches": pass.dispatches,
            "triangles": pass.triangles,
            "rt_w": rt_w.map(Value::from).unwrap_or_else(|| json!("-")),
            "rt_h": rt_h.map(Value::from).unwrap_or_else(|| json!("-")),
            "attachments": attachments,
        }));
    }

    // The enrichment sub-walk must not move the user-visible cursor.
    state.restore_cursor(user_eid);

    let top: Vec<Value> = top_draws(&flat, 3)
        .into_iter()
        .map(|a| {
            json!({
                "eid": a.eid,
                "marker": a.parent_marker,
                "triangles": a.triangles(),
            })
        })
        .collect();

    Ok(json!({"per_pass": per_pass, "top_draws": top}))
}

pub fn log(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let level_filter = match p.opt_str("level") {
        Some(level) => {
            let level = level.to_ascii_uppercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(RpcError::invalid_args(format!("invalid level: {level}")));
            }
            Some(level)
        }
        None => None,
    };
    let eid_filter = p.opt_u64("eid")?;

    if state.debug_messages_cache.is_none() {
        let messages = {
            let (replay, _) = state.replay_and_cursor()?;
            replay.debug_messages()
        };
        state.debug_messages_cache = Some(messages);
    }
    let Some(messages) = state.debug_messages_cache.as_ref() else {
        return Ok(json!({"messages": []}));
    };

    let rows: Vec<Value> = messages
        .iter()
        .filter(|m| {
            level_filter
                .as_deref()
                .map(|lvl| severity_name(m.severity) == lvl)
                .unwrap_or(true)
                && eid_filter.map(|eid| m.eid == eid).unwrap_or(true)
        })
        .map(|m| json!({"level": severity_name(m.severity), "eid": m.eid, "message": m.message}))
        .collect();
    Ok(json!({"messages": rows}))
}

fn matches_type_filter(kind: ActionKind, filter: &str) -> bool {
    match filter.to_ascii_lowercase().as_str() {
        "draw" => kind.is_draw(),
        "dispatch" => kind == ActionKind::Dispatch,
        "clear" => kind == ActionKind::Clear,
        "copy" => kind == ActionKind::Copy,
        other => kind.name().eq_ignore_ascii_case(other),
    }
}

pub fn events(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let mut flat = state.flat_actions();

    if let Some(filter) = p.opt_str("type") {
        flat.retain(|a| matches_type_filter(a.kind(), filter));
    }
    if let Some(pattern) = p.opt_str("filter") {
        let needle = pattern.to_ascii_lowercase();
        flat.retain(|a| a.name.to_ascii_lowercase().contains(&needle));
    }
    if let Some(range) = p.opt_str("range") {
        if let Some((lo, hi)) = range.split_once(':') {
            let lo: u64 = if lo.is_empty() {
                0
            } else {
                lo.parse()
                    .map_err(|_| RpcError::invalid_args("range bounds must be integers"))?
            };
            let hi: u64 = if hi.is_empty() {
                u64::MAX
            } else {
                hi.parse()
                    .map_err(|_| RpcError::invalid_args("range bounds must be integers"))?
            };
            flat.retain(|a| lo <= a.eid && a.eid <= hi);
        }
    }
    if let Some(limit) = p.opt_u64("limit")? {
        flat.truncate(limit as usize);
    }

    let rows: Vec<Value> = flat
        .iter()
        .map(|a| json!({"eid": a.eid, "type": a.kind().name(), "name": a.name}))
        .collect();
    Ok(json!({"events": rows}))
}

pub fn draws(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let mut flat = state.flat_actions();

    if let Some(pass_name) = p.opt_str("pass") {
        match find_pass(&state.passes, pass_name) {
            Some(pass) => {
                let name = pass.name.clone();
                flat.retain(|a| a.pass_name == name);
            }
            None => flat.clear(),
        }
    }
    let totals = aggregate_totals(&flat);

    let mut draws: Vec<FlatAction> = flat.into_iter().filter(|a| a.kind().is_draw()).collect();
    if p.opt_str("sort") == Some("triangles") {
        draws.sort_by(|a, b| b.triangles().cmp(&a.triangles()));
    }
    if let Some(limit) = p.opt_u64("limit")? {
        draws.truncate(limit as usize);
    }

    let rows: Vec<Value> = draws
        .iter()
        .map(|a| {
            json!({
                "eid": a.eid,
                "type": a.kind().name(),
                "triangles": a.triangles(),
                "instances": a.num_instances,
                "pass": a.pass_name,
                "marker": a.parent_marker,
            })
        })
        .collect();
    let summary = format!(
        "{} draw calls ({} indexed, {} dispatches, {} clears)",
        totals.total_draws, totals.indexed_draws, totals.dispatches, totals.clears
    );
    Ok(json!({"draws": rows, "summary": summary}))
}

pub fn event(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.require_u64("eid")?;
    let replay = state.replay_ref()?;
    let action = find_action(replay.root_actions(), eid).ok_or_else(|| {
        RpcError::new(
            ErrorKind::OutOfRange,
            format!("eid {eid} out of range (max: {})", state.cursor.max_eid()),
        )
    })?;

    let chunks = replay.structured_chunks();
    let mut api_call = "-".to_owned();
    let mut chunk_params: Vec<(String, String)> = Vec::new();
    for evt in &action.api_events {
        if let Some(chunk) = chunks.get(evt.chunk_index) {
            api_call = chunk.name.clone();
            chunk_params.extend(chunk.params.iter().cloned());
        }
    }

    let parameters = if chunk_params.is_empty() {
        json!("-")
    } else {
        let lines: Vec<String> = chunk_params
            .iter()
            .map(|(k, v)| format!("  {k:<20}{v}"))
            .collect();
        json!(format!("\n{}", lines.join("\n")))
    };
    Ok(json!({
        "EID": eid,
        "API Call": api_call,
        "Parameters": parameters,
        "Duration": "-",
    }))
}

pub fn draw(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let eid = p.u64_or("eid", state.cursor.current())?;
    let replay = state.replay_ref()?;
    let action = find_action(replay.root_actions(), eid).ok_or_else(|| {
        RpcError::new(
            ErrorKind::OutOfRange,
            format!("eid {eid} out of range (max: {})", state.cursor.max_eid()),
        )
    })?;
    let name = action.name.clone();
    let triangles = action.triangles();
    let instances = action.num_instances.max(1);

    let flat = state.flat_actions();
    let marker = flat
        .iter()
        .find(|a| a.eid == eid)
        .map(|a| a.parent_marker.clone())
        .unwrap_or_else(|| "-".to_owned());

    Ok(json!({
        "Event": eid,
        "Type": name,
        "Marker": marker,
        "Triangles": triangles,
        "Instances": instances,
    }))
}

pub fn passes(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let rows: Vec<Value> = state
        .passes
        .iter()
        .map(|pass| {
            json!({
                "name": pass.name,
                "begin_eid": pass.begin_eid,
                "end_eid": pass.end_eid,
                "draws": pass.draws,
                "dispatches": pass.dispatches,
                "triangles": pass.triangles,
            })
        })
        .collect();
    Ok(json!({"tree": {"passes": rows}}))
}

pub fn pass(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let pass = if let Some(index) = p.opt_u64("index")? {
        state
            .passes
            .get(index as usize)
            .cloned()
            .ok_or_else(|| RpcError::not_found("pass not found"))?
    } else if let Some(name) = p.opt_str("name") {
        find_pass(&state.passes, name)
            .cloned()
            .ok_or_else(|| RpcError::not_found("pass not found"))?
    } else {
        return Err(RpcError::invalid_args("missing index or name"));
    };

    let mut detail = json!({
        "name": pass.name,
        "begin_eid": pass.begin_eid,
        "end_eid": pass.end_eid,
        "draws": pass.draws,
        "dispatches": pass.dispatches,
        "triangles": pass.triangles,
    });

    let user_eid = state.cursor.current();
    let (color_targets, depth_target) = if state.seek(pass.begin_eid).is_ok() {
        let snap = state.replay_ref()?.pipe_snapshot();
        let colors: Vec<Value> = snap
            .color_targets
            .iter()
            .filter(|&&t| t != 0)
            .map(|&t| json!({"id": t}))
            .collect();
        let depth = if snap.depth_target != 0 {
            json!(snap.depth_target)
        } else {
            Value::Null
        };
        (colors, depth)
    } else {
        (Vec::new(), Value::Null)
    };
    state.restore_cursor(user_eid);

    detail["color_targets"] = json!(color_targets);
    detail["depth_target"] = depth_target;
    Ok(detail)
}

pub fn pass_deps(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let usage = state.usage_map()?;
    let edges = build_pass_deps(&state.passes, &usage);
    let rows: Vec<Value> = edges.iter().map(|e| e.to_json()).collect();
    Ok(json!({"edges": rows}))
}

pub fn resources(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let replay = state.replay_ref()?;
    let mut rows = resource_rows(replay);

    if let Some(ty) = p.opt_str("type") {
        rows.retain(|r| {
            r["type"]
                .as_str()
                .is_some_and(|t| t.eq_ignore_ascii_case(ty))
        });
    }
    if let Some(name) = p.opt_str("name") {
        let needle = name.to_ascii_lowercase();
        rows.retain(|r| {
            r["name"]
                .as_str()
                .is_some_and(|n| n.to_ascii_lowercase().contains(&needle))
        });
    }
    match p.opt_str("sort") {
        Some("name") => rows.sort_by_key(|r| r["name"].as_str().unwrap_or("").to_ascii_lowercase()),
        Some("type") => rows.sort_by_key(|r| r["type"].as_str().unwrap_or("").to_ascii_lowercase()),
        _ => {}
    }
    Ok(json!({"rows": rows}))
}

pub fn resource(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.u64_or("id", 0)?;
    let replay = state.replay_ref()?;
    let found = replay
        .resources()
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| RpcError::not_found("resource not found"))?;
    Ok(json!({"resource": {"id": found.id, "type": found.ty, "name": found.name}}))
}

pub fn usage(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.require_u64("id")?;
    let replay = state.replay_ref()?;
    if !replay.resources().iter().any(|r| r.id == id) {
        return Err(RpcError::not_found(format!("resource {id} not found")));
    }
    let entries: Vec<Value> = replay
        .usage(id)
        .iter()
        .map(|eu| json!({"eid": eu.eid, "usage": eu.kind.name()}))
        .collect();
    Ok(json!({"entries": entries}))
}

pub fn count(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let what = p.require_str("what")?;
    let pass = p.opt_str("pass");

    let value = match what {
        "resources" => state.replay_ref()?.resources().len() as u64,
        "shaders" => {
            state.ensure_shader_cache()?;
            state.shader_cache.meta.len() as u64
        }
        other => {
            let replay = state.replay_ref()?;
            count_from_actions(replay.root_actions(), other, pass)
                .map_err(|e| RpcError::invalid_args(e.to_string()))?
        }
    };
    Ok(json!({"value": value}))
}

pub fn search(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let pattern = p.require_str("pattern")?.to_owned();
    let stage = match p.opt_str("stage") {
        Some(s) => Some(
            Stage::parse(&s.to_ascii_lowercase())
                .ok_or_else(|| RpcError::invalid_args("invalid stage"))?,
        ),
        None => None,
    };
    let opts = SearchOptions {
        pattern,
        stage,
        case_sensitive: p.bool_or("case_sensitive", false),
        limit: p.usize_or("limit", core_queries::search::DEFAULT_LIMIT)?,
        context: p.usize_or("context", 0)?,
    };
    state.ensure_shader_cache()?;
    search_disasm(&state.shader_cache, &opts).map_err(|e| RpcError::invalid_args(e.to_string()))
}

pub fn shader_map(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.ensure_shader_cache()?;
    let flat = state.flat_actions();
    let rows = shader_map_rows(&flat, &state.shader_cache.stage_map);
    Ok(json!({"rows": rows}))
}

pub fn shaders_preload(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.ensure_shader_cache()?;
    Ok(json!({"done": true, "shaders": state.shader_cache.disasm.len()}))
}

pub fn counter_list(_p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let replay = state.replay_ref()?;
    let counters: Vec<Value> = replay
        .counters()
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "unit": c.unit,
                "type": c.ty,
                "category": c.category,
            })
        })
        .collect();
    Ok(json!({"counters": counters}))
}

pub fn pixel_history(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    let id = p.require_u64("id")?;
    let x = p.require_u64("x")? as u32;
    let y = p.require_u64("y")? as u32;
    if let Some(eid) = p.opt_u64("eid")? {
        state.seek(eid)?;
    }
    let replay = state.replay_ref()?;
    let mods = replay
        .pixel_history(id, x, y)
        .map_err(|e| RpcError::internal(e.to_string()))?;
    let rows: Vec<Value> = mods
        .iter()
        .map(|m| {
            json!({
                "eid": m.eid,
                "fragment": m.fragment,
                "depth": m.depth,
                "passed": m.passed,
                "flags": m.flags,
            })
        })
        .collect();
    Ok(json!({"modifications": rows}))
}
