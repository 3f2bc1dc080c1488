//! Per-pass stats comparison.

use serde_json::{json, Value};

use crate::draws::DiffStatus;

/// One per-pass stats row as returned by the `stats` RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRow {
    pub name: String,
    pub draws: u64,
    pub dispatches: u64,
    pub triangles: u64,
}

impl PassRow {
    pub fn from_json(row: &Value) -> Self {
        Self {
            name: row["name"].as_str().unwrap_or("").to_owned(),
            draws: row["draws"].as_u64().unwrap_or(0),
            dispatches: row["dispatches"].as_u64().unwrap_or(0),
            triangles: row["triangles"].as_u64().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDiffRow {
    pub name: String,
    pub status: DiffStatus,
    pub draws_a: Option<u64>,
    pub draws_b: Option<u64>,
    pub draws_delta: String,
    pub dispatches_a: Option<u64>,
    pub dispatches_b: Option<u64>,
    pub dispatches_delta: String,
    pub triangles_a: Option<u64>,
    pub triangles_b: Option<u64>,
    pub triangles_delta: String,
}

impl PassDiffRow {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "status": self.status.name(),
            "draws_a": self.draws_a,
            "draws_b": self.draws_b,
            "draws_delta": self.draws_delta,
            "dispatches_a": self.dispatches_a,
            "dispatches_b": self.dispatches_b,
            "dispatches_delta": self.dispatches_delta,
            "triangles_a": self.triangles_a,
            "triangles_b": self.triangles_b,
            "triangles_delta": self.triangles_delta,
        })
    }
}

/// Deltas carry an explicit sign; a missing side renders `"-"`.
fn format_delta(a: Option<u64>, b: Option<u64>) -> String {
    match (a, b) {
        (Some(a), Some(b)) => {
            let delta = b as i64 - a as i64;
            if delta > 0 {
                format!("+{delta}")
            } else {
                delta.to_string()
            }
        }
        _ => "-".to_owned(),
    }
}

fn match_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Match pass rows by trimmed case-insensitive name. Output preserves A-side
/// order, with B-only passes appended in B order.
pub fn diff_stats(a: &[PassRow], b: &[PassRow]) -> Vec<PassDiffRow> {
    let mut rows = Vec::new();
    let mut used_b: Vec<bool> = vec![false; b.len()];

    for ra in a {
        let found = b
            .iter()
            .enumerate()
            .find(|(i, rb)| !used_b[*i] && match_key(&rb.name) == match_key(&ra.name));
        match found {
            Some((i, rb)) => {
                used_b[i] = true;
                let status = if ra.draws == rb.draws
                    && ra.dispatches == rb.dispatches
                    && ra.triangles == rb.triangles
                {
                    DiffStatus::Equal
                } else {
                    DiffStatus::Modified
                };
                rows.push(PassDiffRow {
                    name: ra.name.trim().to_owned(),
                    status,
                    draws_a: Some(ra.draws),
                    draws_b: Some(rb.draws),
                    draws_delta: format_delta(Some(ra.draws), Some(rb.draws)),
                    dispatches_a: Some(ra.dispatches),
                    dispatches_b: Some(rb.dispatches),
                    dispatches_delta: format_delta(Some(ra.dispatches), Some(rb.dispatches)),
                    triangles_a: Some(ra.triangles),
                    triangles_b: Some(rb.triangles),
                    triangles_delta: format_delta(Some(ra.triangles), Some(rb.triangles)),
                });
            }
            None => rows.push(PassDiffRow {
                name: ra.name.trim().to_owned(),
                status: DiffStatus::Deleted,
                draws_a: Some(ra.draws),
                draws_b: None,
                draws_delta: "-".into(),
                dispatches_a: Some(ra.dispatches),
                dispatches_b: None,
                dispatches_delta: "-".into(),
                triangles_a: Some(ra.triangles),
                triangles_b: None,
                triangles_delta: "-".into(),
            }),
        }
    }

    for (i, rb) in b.iter().enumerate() {
        if used_b[i] {
            continue;
        }
        rows.push(PassDiffRow {
            name: rb.name.trim().to_owned(),
            status: DiffStatus::Added,
            draws_a: None,
            draws_b: Some(rb.draws),
            draws_delta: "-".into(),
            dispatches_a: None,
            dispatches_b: Some(rb.dispatches),
            dispatches_delta: "-".into(),
            triangles_a: None,
            triangles_b: Some(rb.triangles),
            triangles_delta: "-".into(),
        });
    }

    rows
}
