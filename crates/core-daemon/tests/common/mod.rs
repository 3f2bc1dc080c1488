//! Shared fixture capture for daemon handler tests.
#![allow(dead_code)]

use serde_json::{json, Map, Value};

use core_daemon::{handle_request, DaemonState};
use core_replay::fixture::{FixtureBuilder, FixtureReplay};
use core_replay::{
    Action, ActionFlags, ApiChunk, ApiEvent, BoundDescriptor, BufferDesc, ConstantBlock,
    PipeSnapshot, ResourceDesc, ShaderReflection, ShaderResource, Stage, TextureDesc, VarValue,
    Viewport,
};
use core_rpc::{Request, Response};

pub const TOKEN: &str = "tok";

pub fn actions() -> Vec<Action> {
    vec![
        Action {
            eid: 10,
            flags: ActionFlags::BEGIN_PASS | ActionFlags::PASS_BOUNDARY,
            name: "Shadow".into(),
            ..Action::default()
        },
        Action {
            eid: 41,
            name: "Shadow/Terrain".into(),
            children: vec![Action {
                eid: 42,
                flags: ActionFlags::DRAWCALL | ActionFlags::INDEXED,
                name: "vkCmdDrawIndexed".into(),
                num_indices: 3600,
                num_instances: 1,
                api_events: vec![ApiEvent {
                    eid: 42,
                    chunk_index: 0,
                }],
                ..Action::default()
            }],
            ..Action::default()
        },
        Action {
            eid: 50,
            flags: ActionFlags::END_PASS | ActionFlags::PASS_BOUNDARY,
            name: "EndPass".into(),
            ..Action::default()
        },
        Action {
            eid: 300,
            flags: ActionFlags::DISPATCH,
            name: "vkCmdDispatch".into(),
            ..Action::default()
        },
    ]
}

pub fn draw_snapshot() -> PipeSnapshot {
    let mut snap = PipeSnapshot {
        topology: "TriangleList".into(),
        viewport: Viewport {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
            min_depth: 0.0,
            max_depth: 1.0,
        },
        color_targets: vec![100],
        depth_target: 101,
        ..PipeSnapshot::default()
    };
    let vs = snap.stage_mut(Stage::Vs);
    vs.shader = 1;
    vs.entry = "main".into();
    vs.reflection = Some(ShaderReflection {
        entry_point: "main".into(),
        ..ShaderReflection::default()
    });
    let ps = snap.stage_mut(Stage::Ps);
    ps.shader = 2;
    ps.entry = "main".into();
    ps.reflection = Some(ShaderReflection {
        entry_point: "main".into(),
        ro_resources: vec![ShaderResource {
            name: "albedo".into(),
            set: 0,
            slot: 1,
        }],
        constant_blocks: vec![ConstantBlock {
            name: "Globals".into(),
            set: 0,
            slot: 0,
            byte_size: 16,
            variables: vec![],
        }],
        ..ShaderReflection::default()
    });
    ps.ro_bindings = vec![BoundDescriptor {
        resource: 100,
        format: "R8G8B8A8_UNORM".into(),
        byte_offset: 0,
        byte_size: 0,
    }];
    ps.cbuffer_bindings = vec![BoundDescriptor {
        resource: 200,
        format: String::new(),
        byte_offset: 0,
        byte_size: 16,
    }];
    ps.cbuffer_values = vec![vec![VarValue {
        name: "exposure".into(),
        ty: "float".into(),
        rows: 1,
        cols: 1,
        f32v: vec![1.5],
        ..VarValue::default()
    }]];
    snap
}

pub fn dispatch_snapshot() -> PipeSnapshot {
    let mut snap = PipeSnapshot::default();
    let cs = snap.stage_mut(Stage::Cs);
    cs.shader = 99;
    cs.entry = "main".into();
    cs.reflection = Some(ShaderReflection {
        entry_point: "main".into(),
        ..ShaderReflection::default()
    });
    snap
}

pub fn fixture_builder() -> FixtureBuilder {
    FixtureReplay::builder()
        .actions(actions())
        .resources(vec![
            ResourceDesc {
                id: 100,
                ty: "Texture2D".into(),
                name: "tex0".into(),
            },
            ResourceDesc {
                id: 101,
                ty: "Texture2D".into(),
                name: "depth0".into(),
            },
            ResourceDesc {
                id: 200,
                ty: "Buffer".into(),
                name: "buf0".into(),
            },
        ])
        .textures(vec![
            TextureDesc {
                resource: 100,
                ty: "Texture2D".into(),
                dimension: 2,
                width: 1920,
                height: 1080,
                depth: 1,
                mips: 3,
                array_size: 1,
                format: "R8G8B8A8_UNORM".into(),
                byte_size: 8294400,
                ms_samp: 1,
                ..TextureDesc::default()
            },
            TextureDesc {
                resource: 101,
                ty: "Texture2D".into(),
                dimension: 2,
                width: 1920,
                height: 1080,
                depth: 1,
                mips: 1,
                array_size: 1,
                format: "D32_SFLOAT".into(),
                ms_samp: 1,
                ..TextureDesc::default()
            },
        ])
        .buffers(vec![BufferDesc {
            resource: 200,
            length: 64,
            creation_flags: 0,
            gpu_address: 0xdead,
        }])
        .chunks(vec![ApiChunk {
            name: "vkCmdDrawIndexed".into(),
            params: vec![
                ("indexCount".into(), "3600".into()),
                ("instanceCount".into(), "1".into()),
            ],
        }])
        .snapshot(42, draw_snapshot())
        .snapshot(300, dispatch_snapshot())
        .disasm(1, "; vs 1\nOpCapability Shader\n")
        .disasm(2, "; ps 2\nOpCapability Shader\n")
        .disasm(99, "; cs 99\nOpCapability Kernel\n")
}

pub fn make_state() -> DaemonState {
    state_with(fixture_builder().build())
}

pub fn state_with(replay: FixtureReplay) -> DaemonState {
    let mut state = DaemonState::new("test.rdc", TOKEN);
    state.attach_replay(Box::new(replay)).unwrap();
    state
}

pub fn req(method: &str, params: Value) -> Request {
    let mut map: Map<String, Value> = params.as_object().cloned().unwrap_or_default();
    map.insert("_token".into(), json!(TOKEN));
    Request::new(1, method, map)
}

pub fn call(state: &mut DaemonState, method: &str, params: Value) -> Response {
    let (response, _) = handle_request(&req(method, params), state);
    response
}

pub fn call_ok(state: &mut DaemonState, method: &str, params: Value) -> Value {
    let response = call(state, method, params);
    assert!(
        response.error.is_none(),
        "{method} failed: {:?}",
        response.error
    );
    response.result.unwrap()
}

pub fn call_err(state: &mut DaemonState, method: &str, params: Value) -> (i64, String) {
    let response = call(state, method, params);
    let err = response.error.expect("expected error response");
    (err.code, err.message)
}
