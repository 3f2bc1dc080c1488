//! Launching a diff session: two daemons, two tokens, two ports.
//!
//! Each side owns its own replay and session loop, so there is no shared
//! replay state between the captures being compared. Both daemons run with
//! the fixed diff idle timeout as a leak backstop; `stop` shuts them down
//! explicitly.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Map;
use tracing::info;

use core_daemon::{spawn_server, DaemonState, ServerConfig, ServerHandle};
use core_replay::ReplayControl;
use core_rpc::{generate_session_id, generate_token, rpc_call};

use crate::service::{DiffContext, DIFF_IDLE_TIMEOUT_SECS};

pub struct DiffSession {
    pub ctx: DiffContext,
    handle_a: ServerHandle,
    handle_b: ServerHandle,
}

fn start_side(
    replay: Box<dyn ReplayControl + Send>,
    capture: &str,
    token: &str,
) -> Result<ServerHandle> {
    let mut state = DaemonState::new(capture, token);
    state
        .attach_replay(replay)
        .map_err(|e| anyhow::anyhow!("attach {capture}: {e}"))?;
    spawn_server(
        state,
        ServerConfig {
            idle_timeout: Some(Duration::from_secs(DIFF_IDLE_TIMEOUT_SECS)),
            ..ServerConfig::default()
        },
    )
    .with_context(|| format!("spawn daemon for {capture}"))
}

fn ping(host: &str, port: u16) -> bool {
    rpc_call(host, port, "ping", Map::new(), Duration::from_secs(5))
        .map(|resp| resp.error.is_none())
        .unwrap_or(false)
}

impl DiffSession {
    /// Start both daemons and verify liveness. Either side failing its ping
    /// tears the pair down.
    pub fn launch(
        replay_a: Box<dyn ReplayControl + Send>,
        capture_a: &str,
        replay_b: Box<dyn ReplayControl + Send>,
        capture_b: &str,
    ) -> Result<DiffSession> {
        let session_id = generate_session_id();
        let token_a = generate_token();
        let token_b = generate_token();

        let handle_a = start_side(replay_a, capture_a, &token_a)?;
        let handle_b = match start_side(replay_b, capture_b, &token_b) {
            Ok(handle) => handle,
            Err(e) => {
                shutdown_side("127.0.0.1", handle_a.addr.port(), &token_a);
                return Err(e);
            }
        };

        let ctx = DiffContext {
            session_id: session_id.clone(),
            host: "127.0.0.1".to_owned(),
            port_a: handle_a.addr.port(),
            port_b: handle_b.addr.port(),
            token_a,
            token_b,
            pid_a: std::process::id(),
            pid_b: std::process::id(),
            capture_a: capture_a.to_owned(),
            capture_b: capture_b.to_owned(),
        };

        if !ping(&ctx.host, ctx.port_a) || !ping(&ctx.host, ctx.port_b) {
            shutdown_side(&ctx.host, ctx.port_a, &ctx.token_a);
            shutdown_side(&ctx.host, ctx.port_b, &ctx.token_b);
            bail!("diff session {session_id}: daemon ping failed");
        }

        info!(
            target: "diff",
            session = %session_id,
            port_a = ctx.port_a,
            port_b = ctx.port_b,
            "pair_started"
        );
        Ok(DiffSession {
            ctx,
            handle_a,
            handle_b,
        })
    }

    /// Shut both daemons down and wait for their loops to exit. Idempotent
    /// at the RPC level: a dead side is ignored.
    pub fn stop(self) {
        shutdown_side(&self.ctx.host, self.ctx.port_a, &self.ctx.token_a);
        shutdown_side(&self.ctx.host, self.ctx.port_b, &self.ctx.token_b);
        self.handle_a.join();
        self.handle_b.join();
        info!(target: "diff", session = %self.ctx.session_id, "pair_stopped");
    }
}

fn shutdown_side(host: &str, port: u16, token: &str) {
    let mut params = Map::new();
    params.insert("_token".to_owned(), serde_json::Value::from(token));
    let _ = rpc_call(host, port, "shutdown", params, Duration::from_secs(5));
}

/// Process exit code for the caller: both daemons failed → 2 (fatal), any
/// divergence → 1, all equal → 0.
pub fn exit_code(both_failed: bool, any_differences: bool) -> i32 {
    if both_failed {
        2
    } else if any_differences {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_semantics() {
        assert_eq!(exit_code(true, false), 2);
        assert_eq!(exit_code(true, true), 2);
        assert_eq!(exit_code(false, true), 1);
        assert_eq!(exit_code(false, false), 0);
    }
}
