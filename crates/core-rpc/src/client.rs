//! Blocking one-shot RPC client.
//!
//! One TCP connection per call: write a request line, read the response
//! line, done. Timeouts are the client's job — the daemon never interrupts
//! an in-flight handler.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::proto::{Request, Response};

#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("empty response")]
    Empty,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue one JSON-RPC call against `host:port`.
pub fn rpc_call(
    host: &str,
    port: u16,
    method: &str,
    params: serde_json::Map<String, Value>,
    timeout: Duration,
) -> Result<Response, RpcClientError> {
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect(&addr).map_err(|source| RpcClientError::Connect {
        addr: addr.clone(),
        source,
    })?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let request = Request::new(1, method, params);
    let mut line = serde_json::to_string(&request)?;
    line.push('\n');
    debug!(target: "rpc.client", %addr, method, "request");

    let mut writer = stream.try_clone()?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    let n = reader.read_line(&mut response_line)?;
    if n == 0 {
        return Err(RpcClientError::Empty);
    }
    Ok(serde_json::from_str(&response_line)?)
}
