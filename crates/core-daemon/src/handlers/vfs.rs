//! VFS handlers: `vfs_ls` and `vfs_tree`.
//!
//! Both resolve the `/current` alias, trigger dynamic population of the
//! touched draw's shader subtree, and answer from the static dictionary.
//! Population seeks the replay, so the user's cursor is restored afterwards.

use serde_json::{json, Value};

use core_rpc::{ErrorKind, RpcError};
use core_vfs::{populate_draw_subtree, NodeKind, VfsNode};

use crate::params::Params;
use crate::state::DaemonState;

/// Strip trailing slashes and resolve the `/current` alias.
fn resolve_alias(state: &DaemonState, path: &str) -> Result<String, RpcError> {
    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    if path == "/current" || path.starts_with("/current/") {
        if state.cursor.current() == 0 {
            return Err(RpcError::new(ErrorKind::NoReplay, "no current eid set"));
        }
        let rest = &path["/current".len()..];
        return Ok(format!("/draws/{}{rest}", state.cursor.current()));
    }
    Ok(path.to_owned())
}

/// Draw eid owning this path, when the path can carry a dynamic subtree.
fn dynamic_eid(path: &str, include_draw_root: bool) -> Option<u64> {
    let mut segments = path.strip_prefix('/')?.split('/');
    if segments.next()? != "draws" {
        return None;
    }
    let eid: u64 = segments.next()?.parse().ok()?;
    match segments.next() {
        Some("shader" | "targets" | "bindings" | "cbuffer") => Some(eid),
        None if include_draw_root => Some(eid),
        _ => None,
    }
}

fn ensure_populated(state: &mut DaemonState, path: &str, include_draw_root: bool) -> Result<(), RpcError> {
    let Some(eid) = dynamic_eid(path, include_draw_root) else {
        return Ok(());
    };
    let already = state
        .vfs
        .as_mut()
        .map(|vfs| vfs.get_draw_subtree(eid).is_some())
        .unwrap_or(true);
    if already {
        return Ok(());
    }
    let user_eid = state.cursor.current();
    state.seek(eid)?;
    let snap = state.replay_ref()?.pipe_snapshot();
    if let Some(vfs) = state.vfs.as_mut() {
        populate_draw_subtree(vfs, eid, &snap);
    }
    state.restore_cursor(user_eid);
    Ok(())
}

fn child_entries(vfs: &core_vfs::VfsTree, path: &str, node: &VfsNode) -> Vec<Value> {
    node.children
        .iter()
        .map(|name| {
            let child_path = if path == "/" {
                format!("/{name}")
            } else {
                format!("{path}/{name}")
            };
            let kind = vfs
                .node(&child_path)
                .map(|n| n.kind)
                .unwrap_or(NodeKind::Leaf);
            json!({"name": name, "kind": kind.name()})
        })
        .collect()
}

/// Long-format rows for the directories that have a tabular schema.
fn long_listing(state: &mut DaemonState, path: &str) -> Result<Option<(Vec<&'static str>, Vec<Value>)>, RpcError> {
    let listing = match path {
        "/draws" => {
            let rows: Vec<Value> = state
                .flat_actions()
                .iter()
                .filter(|a| core_model::is_work(a.flags))
                .map(|a| {
                    json!({
                        "name": a.eid.to_string(),
                        "eid": a.eid,
                        "type": a.kind().name(),
                        "triangles": a.triangles(),
                        "instances": a.num_instances,
                        "pass": a.pass_name,
                        "marker": a.parent_marker,
                    })
                })
                .collect();
            Some((
                vec!["EID", "TYPE", "TRIANGLES", "INSTANCES", "PASS", "MARKER"],
                rows,
            ))
        }
        "/passes" => {
            let rows: Vec<Value> = state
                .passes
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name,
                        "draws": p.draws,
                        "dispatches": p.dispatches,
                        "triangles": p.triangles,
                    })
                })
                .collect();
            Some((vec!["NAME", "DRAWS", "DISPATCHES", "TRIANGLES"], rows))
        }
        "/resources" => {
            let rows = crate::state::resource_rows(state.replay_ref()?);
            Some((vec!["ID", "TYPE", "NAME"], rows))
        }
        "/events" => {
            let rows: Vec<Value> = state
                .flat_actions()
                .iter()
                .map(|a| {
                    json!({
                        "name": a.eid.to_string(),
                        "eid": a.eid,
                        "type": a.kind().name(),
                    })
                })
                .collect();
            Some((vec!["EID", "TYPE", "NAME"], rows))
        }
        "/shaders" => {
            state.ensure_shader_cache()?;
            let mut ids: Vec<u64> = state.shader_cache.meta.keys().copied().collect();
            ids.sort_unstable();
            let rows: Vec<Value> = ids
                .iter()
                .map(|sid| {
                    let meta = &state.shader_cache.meta[sid];
                    let mut stages: Vec<&str> = meta.stages.iter().map(|s| s.name()).collect();
                    stages.sort_unstable();
                    json!({
                        "name": sid.to_string(),
                        "id": sid,
                        "stages": stages.join(","),
                        "uses": meta.uses,
                    })
                })
                .collect();
            Some((vec!["ID", "STAGES", "USES"], rows))
        }
        _ => None,
    };
    Ok(listing)
}

pub fn vfs_ls(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let raw_path = p.opt_str("path").unwrap_or("/");
    let path = resolve_alias(state, raw_path)?;
    ensure_populated(state, &path, false)?;

    let node = state
        .vfs
        .as_ref()
        .and_then(|vfs| vfs.node(&path))
        .cloned()
        .ok_or_else(|| RpcError::not_found(format!("path not found: {path}")))?;

    if node.kind != NodeKind::Dir {
        return Ok(json!({"path": path, "kind": node.kind.name()}));
    }

    let children = match state.vfs.as_ref() {
        Some(vfs) => child_entries(vfs, &path, &node),
        None => Vec::new(),
    };
    if p.bool_or("long", false) {
        if let Some((columns, rows)) = long_listing(state, &path)? {
            return Ok(json!({
                "path": path,
                "kind": "dir",
                "long": true,
                "columns": columns,
                "children": rows,
            }));
        }
    }
    Ok(json!({"path": path, "kind": "dir", "children": children}))
}

fn build_tree(vfs: &core_vfs::VfsTree, path: &str, name: &str, depth: usize) -> Value {
    let node = match vfs.node(path) {
        Some(node) => node,
        None => return json!({"name": name, "kind": "leaf", "children": []}),
    };
    let children: Vec<Value> = if depth == 0 {
        Vec::new()
    } else {
        node.children
            .iter()
            .map(|child| {
                let child_path = if path == "/" {
                    format!("/{child}")
                } else {
                    format!("{path}/{child}")
                };
                build_tree(vfs, &child_path, child, depth - 1)
            })
            .collect()
    };
    json!({"name": name, "kind": node.kind.name(), "children": children})
}

pub fn vfs_tree(p: &Params, state: &mut DaemonState) -> Result<Value, RpcError> {
    state.replay_ref()?;
    let depth = p.u64_or("depth", 2)?;
    if !(1..=8).contains(&depth) {
        return Err(RpcError::invalid_args("depth must be 1-8"));
    }
    let raw_path = p.opt_str("path").unwrap_or("/");
    let path = resolve_alias(state, raw_path)?;
    ensure_populated(state, &path, true)?;

    let vfs = state.vfs.as_ref().ok_or_else(RpcError::no_replay)?;
    if vfs.node(&path).is_none() {
        return Err(RpcError::not_found(format!("path not found: {path}")));
    }

    let name = if path == "/" {
        "/".to_owned()
    } else {
        path.rsplit('/').next().unwrap_or("/").to_owned()
    };
    let tree = build_tree(vfs, &path, &name, depth as usize);
    Ok(json!({"path": path, "tree": tree}))
}
