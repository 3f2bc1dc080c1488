//! Single-session TCP server loop.
//!
//! An accept thread pushes connections into a bounded channel; one consumer
//! drains them to completion, one request per connection. The consumer
//! owning the state serializes every handler — this is a correctness
//! requirement (the replay cursor is shared mutable state), not a tuning
//! choice. `recv_timeout` on the channel doubles as the idle timer.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, RecvTimeoutError};
use serde_json::json;
use tracing::{info, warn};

use core_rpc::{Request, Response, RpcError};

use crate::dispatch::handle_request;
use crate::state::DaemonState;

const CONNECTION_QUEUE: usize = 64;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port.
    pub port: u16,
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 0,
            idle_timeout: None,
        }
    }
}

pub struct ServerHandle {
    pub addr: SocketAddr,
    join: std::thread::JoinHandle<()>,
}

impl ServerHandle {
    pub fn join(self) {
        let _ = self.join.join();
    }
}

fn serve_connection(stream: TcpStream, state: &mut DaemonState) -> bool {
    let peer = stream.peer_addr().ok();
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(e) => {
            warn!(target: "daemon.server", error = %e, "clone_failed");
            return true;
        }
    });
    let mut line = String::new();
    if let Err(e) = reader.read_line(&mut line) {
        warn!(target: "daemon.server", ?peer, error = %e, "read_failed");
        return true;
    }
    if line.trim().is_empty() {
        return true;
    }

    let (response, running) = match serde_json::from_str::<Request>(&line) {
        Ok(request) => handle_request(&request, state),
        Err(e) => (
            Response::error(json!(null), &RpcError::invalid_args(format!("malformed request: {e}"))),
            true,
        ),
    };

    let mut stream = stream;
    match serde_json::to_string(&response) {
        Ok(mut text) => {
            text.push('\n');
            // The client may have timed out and gone; the handler already
            // ran, so a failed write only loses the response.
            if let Err(e) = stream.write_all(text.as_bytes()) {
                warn!(target: "daemon.server", ?peer, error = %e, "write_failed");
            }
        }
        Err(e) => warn!(target: "daemon.server", error = %e, "encode_failed"),
    }
    running
}

/// Run the session loop on a background thread. `ServerHandle::addr` is the
/// bound address; the thread exits after `shutdown` or the idle timeout.
pub fn spawn_server(mut state: DaemonState, config: ServerConfig) -> Result<ServerHandle> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .with_context(|| format!("bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr().context("local_addr")?;

    let (conn_tx, conn_rx) = bounded::<TcpStream>(CONNECTION_QUEUE);
    let stopping = Arc::new(AtomicBool::new(false));

    let acceptor_stopping = Arc::clone(&stopping);
    std::thread::Builder::new()
        .name("rdcap-accept".to_owned())
        .spawn(move || {
            for stream in listener.incoming() {
                if acceptor_stopping.load(Ordering::SeqCst) {
                    break;
                }
                match stream {
                    Ok(stream) => {
                        if conn_tx.send(stream).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: "daemon.server", error = %e, "accept_failed");
                        break;
                    }
                }
            }
        })
        .context("spawn acceptor")?;

    let session = std::thread::Builder::new()
        .name("rdcap-session".to_owned())
        .spawn(move || {
            info!(target: "daemon.server", %addr, "listening");
            loop {
                let received = match config.idle_timeout {
                    Some(timeout) => conn_rx.recv_timeout(timeout),
                    None => conn_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                match received {
                    Ok(stream) => {
                        if !serve_connection(stream, &mut state) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        info!(target: "daemon.server", %addr, "idle_timeout");
                        state.shutdown();
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            stopping.store(true, Ordering::SeqCst);
            // Nudge the acceptor out of its blocking accept.
            let _ = TcpStream::connect(addr);
            info!(target: "daemon.server", %addr, "stopped");
        })
        .context("spawn session loop")?;

    Ok(ServerHandle {
        addr,
        join: session,
    })
}
