//! End-to-end over real loopback TCP: framing, token gate, lifecycle and
//! the idle timeout.

mod common;

use std::time::Duration;

use core_daemon::{spawn_server, ServerConfig};
use core_rpc::rpc_call;
use serde_json::{json, Map, Value};

fn params(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

fn with_token(v: Value) -> Map<String, Value> {
    let mut map = params(v);
    map.insert("_token".into(), json!(common::TOKEN));
    map
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn ping_info_shutdown_over_tcp() {
    let state = common::make_state();
    let handle = spawn_server(state, ServerConfig::default()).unwrap();
    let addr = handle.addr;

    let resp = rpc_call("127.0.0.1", addr.port(), "ping", params(json!({})), TIMEOUT).unwrap();
    assert_eq!(resp.result.unwrap(), json!({"pong": true}));

    let resp = rpc_call("127.0.0.1", addr.port(), "info", with_token(json!({})), TIMEOUT).unwrap();
    assert_eq!(resp.result.unwrap()["API"], json!("Vulkan"));

    // Bad token over the wire.
    let resp = rpc_call(
        "127.0.0.1",
        addr.port(),
        "info",
        params(json!({"_token": "nope"})),
        TIMEOUT,
    )
    .unwrap();
    assert_eq!(resp.error.unwrap().code, -32002);

    let resp = rpc_call(
        "127.0.0.1",
        addr.port(),
        "shutdown",
        with_token(json!({})),
        TIMEOUT,
    )
    .unwrap();
    assert!(resp.error.is_none());
    handle.join();

    // The daemon is gone; a new connection must fail.
    let err = rpc_call("127.0.0.1", addr.port(), "ping", params(json!({})), TIMEOUT);
    assert!(err.is_err() || err.unwrap().error.is_some());
}

#[test]
fn one_request_per_connection() {
    let state = common::make_state();
    let handle = spawn_server(state, ServerConfig::default()).unwrap();
    let port = handle.addr.port();

    // Sequential calls each use a fresh connection and all succeed.
    for _ in 0..3 {
        let resp = rpc_call("127.0.0.1", port, "ping", params(json!({})), TIMEOUT).unwrap();
        assert!(resp.result.is_some());
    }
    let resp = rpc_call("127.0.0.1", port, "shutdown", with_token(json!({})), TIMEOUT).unwrap();
    assert!(resp.error.is_none());
    handle.join();
}

#[test]
fn idle_timeout_stops_the_session() {
    let replay = common::fixture_builder().build();
    let probe = replay.probe();
    let state = common::state_with(replay);
    let handle = spawn_server(
        state,
        ServerConfig {
            idle_timeout: Some(Duration::from_millis(200)),
            ..ServerConfig::default()
        },
    )
    .unwrap();

    handle.join();
    assert!(probe.shutdown_called());
}

#[test]
fn malformed_request_line_gets_an_error() {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;

    let state = common::make_state();
    let handle = spawn_server(state, ServerConfig::default()).unwrap();

    let mut stream = TcpStream::connect(handle.addr).unwrap();
    stream.write_all(b"this is not json\n").unwrap();
    let mut line = String::new();
    BufReader::new(stream.try_clone().unwrap())
        .read_line(&mut line)
        .unwrap();
    let resp: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(resp["error"]["code"], json!(-32602));

    let _ = rpc_call(
        "127.0.0.1",
        handle.addr.port(),
        "shutdown",
        with_token(json!({})),
        TIMEOUT,
    );
    handle.join();
}
