//! Shader debug handlers: trace accumulation and the free-trace contract.

mod common;

use common::{call_err, call_ok, state_with};
use core_replay::fixture::FixtureTrace;
use core_replay::{Stage, TraceStep, VarChange, VarData};
use serde_json::json;

fn pixel_trace() -> FixtureTrace {
    FixtureTrace {
        stage: Some(Stage::Ps),
        batches: vec![
            vec![
                TraceStep {
                    instruction: 0,
                    file: "shader.frag".into(),
                    line: 42,
                    changes: vec![VarChange {
                        name: "fragCoord".into(),
                        ty: "float4".into(),
                        rows: 1,
                        cols: 4,
                        before: VarData::Float(vec![0.0; 4]),
                        after: VarData::Float(vec![320.0, 240.0, 0.5, 1.0]),
                    }],
                },
                TraceStep {
                    instruction: 1,
                    ..TraceStep::default()
                },
            ],
            vec![TraceStep {
                instruction: 2,
                changes: vec![VarChange {
                    name: "outColor".into(),
                    ty: "float4".into(),
                    rows: 1,
                    cols: 4,
                    before: VarData::Float(vec![0.0; 4]),
                    after: VarData::Float(vec![1.0, 0.0, 0.0, 1.0]),
                }],
                ..TraceStep::default()
            }],
        ],
    }
}

#[test]
fn debug_pixel_happy_path() {
    let replay = common::fixture_builder().pixel_trace(pixel_trace()).build();
    let mut state = state_with(replay);
    let result = call_ok(
        &mut state,
        "debug_pixel",
        json!({"eid": 42, "x": 320, "y": 240}),
    );
    assert_eq!(result["eid"], json!(42));
    assert_eq!(result["stage"], json!("ps"));
    assert_eq!(result["total_steps"], json!(3));
    let trace = result["trace"].as_array().unwrap();
    assert_eq!(trace.len(), 3);
    assert_eq!(trace[0]["step"], json!(0));
    assert_eq!(trace[0]["changes"][0]["name"], json!("fragCoord"));
    assert_eq!(
        trace[0]["changes"][0]["after"],
        json!([320.0, 240.0, 0.5, 1.0])
    );
    assert_eq!(result["inputs"][0]["name"], json!("fragCoord"));
    assert_eq!(result["outputs"][0]["name"], json!("outColor"));
    assert_eq!(trace[0]["file"], json!("shader.frag"));
    assert_eq!(trace[0]["line"], json!(42));
}

#[test]
fn debug_pixel_missing_params() {
    let mut state = state_with(common::fixture_builder().build());
    let (code, message) = call_err(&mut state, "debug_pixel", json!({"x": 1, "y": 1}));
    assert_eq!(code, -32602);
    assert!(message.contains("eid"));
    let (code, message) = call_err(&mut state, "debug_pixel", json!({"eid": 42, "y": 1}));
    assert_eq!(code, -32602);
    assert!(message.contains("x"));
    let (code, message) = call_err(&mut state, "debug_pixel", json!({"eid": 42, "x": 1}));
    assert_eq!(code, -32602);
    assert!(message.contains("y"));
}

#[test]
fn debug_pixel_without_fragment_is_32007() {
    let mut state = state_with(common::fixture_builder().build());
    let (code, message) = call_err(
        &mut state,
        "debug_pixel",
        json!({"eid": 42, "x": 1, "y": 1}),
    );
    assert_eq!(code, -32007);
    assert!(message.contains("no fragment"));
}

#[test]
fn debug_pixel_out_of_range_eid() {
    let mut state = state_with(common::fixture_builder().build());
    let (code, _) = call_err(
        &mut state,
        "debug_pixel",
        json!({"eid": 9999, "x": 1, "y": 1}),
    );
    assert_eq!(code, -32002);
}

#[test]
fn trace_is_freed_on_success() {
    let replay = common::fixture_builder().pixel_trace(pixel_trace()).build();
    let probe = replay.probe();
    let mut state = state_with(replay);
    call_ok(&mut state, "debug_pixel", json!({"eid": 42, "x": 1, "y": 1}));
    assert_eq!(probe.freed_trace_count(), 1);
    assert_eq!(probe.live_trace_count(), 0);
}

#[test]
fn trace_is_freed_when_continue_fails() {
    let replay = common::fixture_builder()
        .pixel_trace(pixel_trace())
        .fail_continue_debug()
        .build();
    let probe = replay.probe();
    let mut state = state_with(replay);
    let (code, _) = call_err(&mut state, "debug_pixel", json!({"eid": 42, "x": 1, "y": 1}));
    assert_eq!(code, -32603);
    assert_eq!(probe.freed_trace_count(), 1);
    assert_eq!(probe.live_trace_count(), 0);
}

#[test]
fn debug_vertex_happy_and_missing() {
    let vertex = FixtureTrace {
        stage: Some(Stage::Vs),
        batches: vec![vec![TraceStep {
            changes: vec![VarChange {
                name: "position".into(),
                ty: "float4".into(),
                rows: 1,
                cols: 4,
                before: VarData::Float(vec![0.0; 4]),
                after: VarData::Float(vec![1.0, 2.0, 3.0, 1.0]),
            }],
            ..TraceStep::default()
        }]],
    };
    let replay = common::fixture_builder().vertex_trace(vertex).build();
    let mut state = state_with(replay);
    let result = call_ok(&mut state, "debug_vertex", json!({"eid": 42, "vtx_id": 0}));
    assert_eq!(result["stage"], json!("vs"));
    assert_eq!(result["total_steps"], json!(1));
    assert_eq!(result["trace"][0]["changes"][0]["name"], json!("position"));

    let (code, message) = call_err(&mut state, "debug_vertex", json!({"eid": 42}));
    assert_eq!(code, -32602);
    assert!(message.contains("vtx_id"));
}

#[test]
fn debug_vertex_forwards_instance_idx_and_view() {
    let vertex = FixtureTrace {
        stage: Some(Stage::Vs),
        batches: vec![vec![TraceStep::default()]],
    };
    let replay = common::fixture_builder().vertex_trace(vertex).build();
    let probe = replay.probe();
    let mut state = state_with(replay);
    call_ok(
        &mut state,
        "debug_vertex",
        json!({"eid": 42, "vtx_id": 7, "instance": 2, "idx": 9, "view": 1}),
    );
    assert_eq!(probe.vertex_debug_args(), Some((7, 2, 9, 1)));
}

#[test]
fn debug_vertex_idx_defaults_to_the_vertex_id() {
    let vertex = FixtureTrace {
        stage: Some(Stage::Vs),
        batches: vec![vec![TraceStep::default()]],
    };
    let replay = common::fixture_builder().vertex_trace(vertex).build();
    let probe = replay.probe();
    let mut state = state_with(replay);
    call_ok(&mut state, "debug_vertex", json!({"eid": 42, "vtx_id": 7}));
    assert_eq!(probe.vertex_debug_args(), Some((7, 0, 7, 0)));
}

#[test]
fn debug_vertex_without_trace_is_32007() {
    let mut state = state_with(common::fixture_builder().build());
    let (code, _) = call_err(&mut state, "debug_vertex", json!({"eid": 42, "vtx_id": 0}));
    assert_eq!(code, -32007);
}

#[test]
fn debug_thread_requires_a_dispatch() {
    let thread = FixtureTrace {
        stage: Some(Stage::Cs),
        batches: vec![vec![TraceStep::default()]],
    };
    let replay = common::fixture_builder().thread_trace(thread).build();
    let mut state = state_with(replay);

    let coords = json!({"gx": 0, "gy": 0, "gz": 0, "tx": 0, "ty": 0, "tz": 0});
    let mut params = coords.as_object().unwrap().clone();
    params.insert("eid".into(), json!(300));
    let result = call_ok(&mut state, "debug_thread", serde_json::Value::Object(params));
    assert_eq!(result["stage"], json!("cs"));

    // A draw event is not debuggable as a thread.
    let mut params = coords.as_object().unwrap().clone();
    params.insert("eid".into(), json!(42));
    let (code, message) = call_err(&mut state, "debug_thread", serde_json::Value::Object(params));
    assert_eq!(code, -32602);
    assert!(message.contains("not a dispatch"));
}

#[test]
fn uint_and_sint_values_roundtrip() {
    let trace = FixtureTrace {
        stage: Some(Stage::Ps),
        batches: vec![vec![TraceStep {
            changes: vec![
                VarChange {
                    name: "count".into(),
                    ty: "uint".into(),
                    rows: 1,
                    cols: 1,
                    before: VarData::UInt(vec![0]),
                    after: VarData::UInt(vec![42]),
                },
                VarChange {
                    name: "offset".into(),
                    ty: "int".into(),
                    rows: 1,
                    cols: 1,
                    before: VarData::SInt(vec![0]),
                    after: VarData::SInt(vec![-7]),
                },
            ],
            ..TraceStep::default()
        }]],
    };
    let replay = common::fixture_builder().pixel_trace(trace).build();
    let mut state = state_with(replay);
    let result = call_ok(&mut state, "debug_pixel", json!({"eid": 42, "x": 0, "y": 0}));
    let changes = result["trace"][0]["changes"].as_array().unwrap();
    assert_eq!(changes[0]["after"], json!([42]));
    assert_eq!(changes[1]["after"], json!([-7]));
}
