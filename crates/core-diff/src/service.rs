//! Two-daemon query fan-out.
//!
//! A diff session is a pair of independent daemons with their own ports and
//! tokens. `query_both` issues the same call to both and tolerates either
//! side failing; pairing across a call sequence is preserved by
//! `query_both_sync`.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use core_rpc::{rpc_call, Response};

/// Diff-mode daemons self-terminate after this long without a request, so
/// an abandoned pair cannot outlive its caller for long.
pub const DIFF_IDLE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct DiffContext {
    /// 12-hex id distinguishing this pair in logs.
    pub session_id: String,
    pub host: String,
    pub port_a: u16,
    pub port_b: u16,
    pub token_a: String,
    pub token_b: String,
    pub pid_a: u32,
    pub pid_b: u32,
    pub capture_a: String,
    pub capture_b: String,
}

impl DiffContext {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

fn call_side(
    ctx: &DiffContext,
    port: u16,
    token: &str,
    method: &str,
    params: &Map<String, Value>,
) -> Result<Value, String> {
    // The caller's params are never mutated; the token goes into a copy.
    let mut with_token = params.clone();
    with_token.insert("_token".to_owned(), Value::from(token));
    match rpc_call(&ctx.host, port, method, with_token, ctx.timeout()) {
        Ok(Response {
            error: Some(err), ..
        }) => Err(format!("{} (code {})", err.message, err.code)),
        Ok(resp) => Ok(resp.result.unwrap_or(Value::Null)),
        Err(e) => Err(e.to_string()),
    }
}

/// Issue one method against both daemons. Either result may be `None`; the
/// error string describes which side(s) failed.
pub fn query_both(
    ctx: &DiffContext,
    method: &str,
    params: &Map<String, Value>,
) -> (Option<Value>, Option<Value>, Option<String>) {
    debug!(target: "diff", session = %ctx.session_id, method, "query_both");
    let ra = call_side(ctx, ctx.port_a, &ctx.token_a, method, params);
    let rb = call_side(ctx, ctx.port_b, &ctx.token_b, method, params);

    let mut errors: Vec<String> = Vec::new();
    if let Err(e) = &ra {
        warn!(target: "diff", session = %ctx.session_id, method, side = "a", error = %e, "side_failed");
        errors.push(format!("A: {e}"));
    }
    if let Err(e) = &rb {
        warn!(target: "diff", session = %ctx.session_id, method, side = "b", error = %e, "side_failed");
        errors.push(format!("B: {e}"));
    }
    (
        ra.ok(),
        rb.ok(),
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        },
    )
}

/// Issue a sequence of calls, preserving per-call pairing: result index `i`
/// on both sides answers `calls[i]`.
pub fn query_both_sync(
    ctx: &DiffContext,
    calls: &[(String, Map<String, Value>)],
) -> (Vec<Option<Value>>, Vec<Option<Value>>, Option<String>) {
    let mut results_a = Vec::with_capacity(calls.len());
    let mut results_b = Vec::with_capacity(calls.len());
    let mut errors: Vec<String> = Vec::new();

    for (method, params) in calls {
        let (ra, rb, err) = query_both(ctx, method, params);
        results_a.push(ra);
        results_b.push(rb);
        if let Some(e) = err {
            errors.push(format!("{method}: {e}"));
        }
    }
    (
        results_a,
        results_b,
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        },
    )
}
