//! Pipeline section routing, bindings, shader queries and buffer decode
//! over the dispatch boundary.

mod common;

use common::{call_err, call_ok, make_state};
use serde_json::json;

#[test]
fn pipeline_summary_row() {
    let mut state = make_state();
    let result = call_ok(&mut state, "pipeline", json!({"eid": 42}));
    let row = &result["row"];
    assert_eq!(row["eid"], json!(42));
    assert_eq!(row["api"], json!("Vulkan"));
    assert_eq!(row["topology"], json!("TriangleList"));
    assert!(row.get("section").is_none());
}

#[test]
fn pipeline_section_routing() {
    let mut state = make_state();
    let result = call_ok(&mut state, "pipeline", json!({"eid": 42, "section": "topology"}));
    assert_eq!(result["topology"], json!("TriangleList"));

    let result = call_ok(&mut state, "pipeline", json!({"eid": 42, "section": "viewport"}));
    assert_eq!(result["x"], json!(0.0));
    assert_eq!(result["y"], json!(0.0));
    assert!(result["width"].as_f64().unwrap() > 0.0);
    assert!(result["height"].as_f64().unwrap() > 0.0);
    assert_eq!(result["minDepth"], json!(0.0));
    assert_eq!(result["maxDepth"], json!(1.0));

    // A stage section yields the summary row with stage detail.
    let result = call_ok(&mut state, "pipeline", json!({"eid": 42, "section": "ps"}));
    assert_eq!(result["row"]["section"], json!("ps"));
    assert_eq!(result["row"]["section_detail"]["shader"], json!(2));

    let (code, message) = call_err(&mut state, "pipeline", json!({"eid": 42, "section": "bad"}));
    assert_eq!(code, -32602);
    assert!(message.contains("invalid section"));
}

#[test]
fn every_pipe_method_answers() {
    let mut state = make_state();
    for method in [
        "pipe_topology",
        "pipe_viewport",
        "pipe_scissor",
        "pipe_blend",
        "pipe_stencil",
        "pipe_vinputs",
        "pipe_samplers",
        "pipe_vbuffers",
        "pipe_ibuffer",
        "pipe_push_constants",
        "pipe_rasterizer",
        "pipe_depth_stencil",
        "pipe_msaa",
    ] {
        let result = call_ok(&mut state, method, json!({"eid": 42}));
        assert_eq!(result["eid"], json!(42), "{method}");
    }
}

#[test]
fn pipe_seek_out_of_range() {
    let mut state = make_state();
    let (code, message) = call_err(&mut state, "pipe_topology", json!({"eid": 9999}));
    assert_eq!(code, -32002);
    assert!(message.contains("out of range"));
}

#[test]
fn eid_defaults_to_the_current_cursor() {
    let mut state = make_state();
    call_ok(&mut state, "pipe_topology", json!({"eid": 42}));
    let result = call_ok(&mut state, "pipe_topology", json!({}));
    assert_eq!(result["eid"], json!(42));
}

#[test]
fn bindings_rows_with_filters() {
    let mut state = make_state();
    let result = call_ok(&mut state, "bindings", json!({"eid": 42}));
    let rows = result["rows"].as_array().unwrap();
    // ps: one ro + one cbuffer.
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["stage"] == json!("ps")));
    assert!(rows.iter().all(|r| r["eid"] == json!(42)));

    let result = call_ok(&mut state, "bindings", json!({"eid": 42, "binding": 1}));
    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], json!("ro"));
    assert_eq!(rows[0]["set"], json!(0));
    assert_eq!(rows[0]["slot"], json!(1));

    let result = call_ok(&mut state, "bindings", json!({"eid": 42, "set": 7}));
    assert_eq!(result["rows"].as_array().unwrap().len(), 0);
}

#[test]
fn shader_row_and_all_stages() {
    let mut state = make_state();
    let result = call_ok(&mut state, "shader", json!({"eid": 42, "stage": "ps"}));
    let row = &result["row"];
    assert_eq!(row["shader"], json!(2));
    assert_eq!(row["entry"], json!("main"));
    assert_eq!(row["ro"], json!(1));
    assert_eq!(row["cbuffers"], json!(1));

    let (code, _) = call_err(&mut state, "shader", json!({"eid": 42, "stage": "zz"}));
    assert_eq!(code, -32602);

    let result = call_ok(&mut state, "shader_all", json!({"eid": 42}));
    let stages = result["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0]["stage"], json!("vs"));
    assert_eq!(stages[1]["stage"], json!("ps"));
}

#[test]
fn shaders_table_and_preload_idempotence() {
    let mut state = make_state();
    let first = call_ok(&mut state, "shaders_preload", json!({}));
    assert_eq!(first["done"], json!(true));
    assert_eq!(first["shaders"], json!(3));

    let result = call_ok(&mut state, "shaders", json!({}));
    let rows = result["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["shader"], json!(1));
    assert_eq!(rows[0]["stages"], json!("vs"));
    assert_eq!(rows[0]["uses"], json!(1));

    let result = call_ok(&mut state, "shaders", json!({"stage": "cs"}));
    assert_eq!(result["rows"].as_array().unwrap().len(), 1);

    let second = call_ok(&mut state, "shaders_preload", json!({}));
    assert_eq!(second["shaders"], json!(3));
}

#[test]
fn preload_walks_the_frame_once() {
    let replay = common::fixture_builder().build();
    let probe = replay.probe();
    let mut state = common::state_with(replay);

    call_ok(&mut state, "shaders_preload", json!({}));
    // One seek per unique work event (42 and 300).
    assert_eq!(probe.seek_count(), 2);
    call_ok(&mut state, "shaders_preload", json!({}));
    assert_eq!(probe.seek_count(), 2);
}

#[test]
fn preload_restores_the_cursor() {
    let mut state = make_state();
    call_ok(&mut state, "pipe_topology", json!({"eid": 42}));
    call_ok(&mut state, "shaders_preload", json!({}));
    assert_eq!(state.cursor.current(), 42);
}

#[test]
fn shader_cache_views_by_id() {
    let mut state = make_state();
    let result = call_ok(&mut state, "shader_list_info", json!({"id": 2}));
    assert_eq!(result["stages"], json!(["ps"]));
    assert_eq!(result["first_eid"], json!(42));
    assert_eq!(result["entry"], json!("main"));

    let result = call_ok(&mut state, "shader_list_disasm", json!({"id": 2}));
    assert!(result["disasm"].as_str().unwrap().contains("ps 2"));

    let (code, _) = call_err(&mut state, "shader_list_info", json!({"id": 777}));
    assert_eq!(code, -32001);
}

#[test]
fn shader_reflect_and_disasm() {
    let mut state = make_state();
    let result = call_ok(&mut state, "shader_reflect", json!({"eid": 42, "stage": "ps"}));
    assert_eq!(result["stage"], json!("ps"));
    assert_eq!(result["constant_blocks"][0]["name"], json!("Globals"));

    // gs has no reflection bound.
    let (code, message) = call_err(&mut state, "shader_reflect", json!({"eid": 42, "stage": "gs"}));
    assert_eq!(code, -32001);
    assert!(message.contains("no reflection"));

    let result = call_ok(&mut state, "shader_disasm", json!({"eid": 42, "stage": "ps"}));
    assert_eq!(result["target"], json!("SPIR-V"));
    assert!(result["disasm"].as_str().unwrap().contains("ps 2"));

    let result = call_ok(&mut state, "shader_targets", json!({}));
    assert_eq!(result["targets"], json!(["SPIR-V"]));
}

#[test]
fn shader_source_falls_back_to_disasm() {
    let mut state = make_state();
    let result = call_ok(&mut state, "shader_source", json!({"eid": 42, "stage": "ps"}));
    assert_eq!(result["has_debug_info"], json!(false));
    assert!(result["source"].as_str().unwrap().contains("ps 2"));
    assert_eq!(result["files"], json!([]));
}

#[test]
fn shader_constants_flatten_runtime_values() {
    let mut state = make_state();
    let result = call_ok(&mut state, "shader_constants", json!({"eid": 42, "stage": "ps"}));
    let constants = result["constants"].as_array().unwrap();
    assert_eq!(constants.len(), 1);
    assert_eq!(constants[0]["name"], json!("Globals"));
    let vars = constants[0]["variables"].as_array().unwrap();
    assert_eq!(vars[0]["name"], json!("exposure"));
    assert_eq!(vars[0]["value"], json!(1.5));
}

#[test]
fn cbuffer_decode_by_set_and_binding() {
    let mut state = make_state();
    let result = call_ok(
        &mut state,
        "cbuffer_decode",
        json!({"eid": 42, "stage": "ps", "set": 0, "binding": 0}),
    );
    assert_eq!(result["variables"][0]["name"], json!("exposure"));
    assert_eq!(result["variables"][0]["value"], json!(1.5));

    let (code, message) = call_err(
        &mut state,
        "cbuffer_decode",
        json!({"eid": 42, "stage": "ps", "set": 3, "binding": 9}),
    );
    assert_eq!(code, -32001);
    assert!(message.contains("set=3"));

    let (code, _) = call_err(
        &mut state,
        "cbuffer_decode",
        json!({"eid": 42, "stage": "gs", "set": 0, "binding": 0}),
    );
    assert_eq!(code, -32001);
}

#[test]
fn descriptors_report_the_bound_resources() {
    let mut state = make_state();
    let result = call_ok(&mut state, "descriptors", json!({"eid": 42}));
    let rows = result["descriptors"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let ro = rows.iter().find(|r| r["type"] == json!("ro")).unwrap();
    assert_eq!(ro["stage"], json!("ps"));
    assert_eq!(ro["resource_id"], json!(100));
    assert_eq!(ro["format"], json!("R8G8B8A8_UNORM"));
    assert_eq!(ro["name"], json!("albedo"));
    assert_eq!(ro["slot"], json!(1));

    let cb = rows.iter().find(|r| r["type"] == json!("cbuffer")).unwrap();
    assert_eq!(cb["resource_id"], json!(200));
    assert_eq!(cb["byte_size"], json!(16));
    assert_eq!(cb["format"], json!("-"));
    assert_eq!(cb["name"], json!("Globals"));
}

#[test]
fn descriptors_without_bound_info_fall_back_to_defaults() {
    // A stage whose reflection declares a binding the snapshot carries no
    // bound descriptor for: resource 0, declared block size.
    let mut snap = common::draw_snapshot();
    let ps = snap.stage_mut(core_replay::Stage::Ps);
    ps.ro_bindings.clear();
    ps.cbuffer_bindings.clear();
    let replay = common::fixture_builder().snapshot(42, snap).build();
    let mut state = common::state_with(replay);

    let result = call_ok(&mut state, "descriptors", json!({"eid": 42}));
    let rows = result["descriptors"].as_array().unwrap();
    let ro = rows.iter().find(|r| r["type"] == json!("ro")).unwrap();
    assert_eq!(ro["resource_id"], json!(0));
    assert_eq!(ro["format"], json!("-"));
    let cb = rows.iter().find(|r| r["type"] == json!("cbuffer")).unwrap();
    assert_eq!(cb["byte_size"], json!(16));
}
