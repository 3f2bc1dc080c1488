//! Frame-wide aggregates, top draws, and the shader map.

use core_model::{ActionKind, FlatAction};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total_draws: u64,
    pub indexed_draws: u64,
    pub non_indexed_draws: u64,
    pub dispatches: u64,
    pub clears: u64,
    pub copies: u64,
}

/// One flat pass over the action list.
pub fn aggregate_totals(flat: &[FlatAction]) -> Totals {
    let mut totals = Totals::default();
    for a in flat {
        match a.kind() {
            ActionKind::DrawIndexed => {
                totals.total_draws += 1;
                totals.indexed_draws += 1;
            }
            ActionKind::Draw => {
                totals.total_draws += 1;
                totals.non_indexed_draws += 1;
            }
            ActionKind::Dispatch => totals.dispatches += 1,
            ActionKind::Clear => totals.clears += 1,
            ActionKind::Copy => totals.copies += 1,
            _ => {}
        }
    }
    totals
}

/// The `limit` heaviest draws by triangle count, descending.
pub fn top_draws(flat: &[FlatAction], limit: usize) -> Vec<&FlatAction> {
    let mut draws: Vec<&FlatAction> = flat.iter().filter(|a| a.kind().is_draw()).collect();
    draws.sort_by(|a, b| b.triangles().cmp(&a.triangles()));
    draws.truncate(limit);
    draws
}

/// One row per draw/dispatch event with the six bound shader ids, `"-"`
/// where a stage is unbound. `stage_map` comes from the shader cache.
pub fn shader_map_rows(
    flat: &[FlatAction],
    stage_map: &ahash::AHashMap<u64, [u64; 6]>,
) -> Vec<Value> {
    let mut rows = Vec::new();
    for a in flat {
        let Some(ids) = stage_map.get(&a.eid) else {
            continue;
        };
        let cell = |id: u64| -> Value {
            if id == 0 {
                json!("-")
            } else {
                json!(id)
            }
        };
        rows.push(json!({
            "eid": a.eid,
            "vs": cell(ids[0]),
            "hs": cell(ids[1]),
            "ds": cell(ids[2]),
            "gs": cell(ids[3]),
            "ps": cell(ids[4]),
            "cs": cell(ids[5]),
        }));
    }
    rows
}
