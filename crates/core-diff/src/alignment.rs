//! LCS alignment of two draw sequences.
//!
//! Marker-keyed matching is the high-confidence path: each draw keys on
//! `(marker_path, draw_type, occurrence_within_marker)`. Without markers the
//! fallback keys on `(draw_type, shader_hash, topology)`. Combined inputs
//! above the LCS size cutoff are bucketed by top-level marker token and
//! aligned per bucket.

use serde_json::Value;

/// Above this combined length, one quadratic LCS is too expensive; inputs
/// are grouped by top-level marker first.
pub const LCS_SIZE_CUTOFF: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub eid: u64,
    pub draw_type: String,
    /// `"-"` when the draw has no marker ancestor.
    pub marker_path: String,
    pub triangles: u64,
    pub instances: u64,
    pub pass_name: String,
    pub shader_hash: String,
    pub topology: String,
}

/// Convert `draws` RPC rows into records.
pub fn build_draw_records(rows: &[Value]) -> Vec<DrawRecord> {
    rows.iter()
        .map(|d| DrawRecord {
            eid: d["eid"].as_u64().unwrap_or(0),
            draw_type: d["type"].as_str().unwrap_or("").to_owned(),
            marker_path: d["marker"].as_str().unwrap_or("-").to_owned(),
            triangles: d["triangles"].as_u64().unwrap_or(0),
            instances: d["instances"].as_u64().unwrap_or(0),
            pass_name: d["pass"].as_str().unwrap_or("").to_owned(),
            shader_hash: String::new(),
            topology: String::new(),
        })
        .collect()
}

/// Any draw on either side carrying a real marker enables marker keying.
pub fn has_markers(records: &[DrawRecord]) -> bool {
    records.iter().any(|r| r.marker_path != "-")
}

/// Marker keys: `(marker_path, draw_type, occurrence_index_within_marker)`.
pub fn make_match_keys(records: &[DrawRecord]) -> Vec<(String, String, usize)> {
    let mut counts: ahash::AHashMap<(String, String), usize> = ahash::AHashMap::new();
    records
        .iter()
        .map(|r| {
            let slot = counts
                .entry((r.marker_path.clone(), r.draw_type.clone()))
                .or_insert(0);
            let key = (r.marker_path.clone(), r.draw_type.clone(), *slot);
            *slot += 1;
            key
        })
        .collect()
}

/// Fallback keys: `(draw_type, shader_hash, topology)` — lower confidence.
pub fn make_fallback_keys(records: &[DrawRecord]) -> Vec<(String, String, String)> {
    records
        .iter()
        .map(|r| (r.draw_type.clone(), r.shader_hash.clone(), r.topology.clone()))
        .collect()
}

/// Classic LCS over key sequences. Output preserves order: matched pairs on
/// the diagonal, `(Some, None)` deletions on the A side, `(None, Some)`
/// insertions on the B side.
pub fn lcs_align<K: PartialEq>(a: &[K], b: &[K]) -> Vec<(Option<usize>, Option<usize>)> {
    let n = a.len();
    let m = b.len();
    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut out: Vec<(Option<usize>, Option<usize>)> = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            out.push((Some(i - 1), Some(j - 1)));
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] >= dp[i][j - 1] {
            out.push((Some(i - 1), None));
            i -= 1;
        } else {
            out.push((None, Some(j - 1)));
            j -= 1;
        }
    }
    while i > 0 {
        out.push((Some(i - 1), None));
        i -= 1;
    }
    while j > 0 {
        out.push((None, Some(j - 1)));
        j -= 1;
    }
    out.reverse();
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Marker,
    Fallback,
}

/// Top-level marker token for bucketing (`"GBuffer/Floor"` → `"GBuffer"`).
fn marker_group(marker: &str) -> &str {
    marker.split_once('/').map(|(head, _)| head).unwrap_or(marker)
}

fn align_indices<K: PartialEq>(
    keys_a: &[K],
    keys_b: &[K],
) -> Vec<(Option<usize>, Option<usize>)> {
    lcs_align(keys_a, keys_b)
}

/// Align two draw sequences. Returns ordered record pairs and the keying
/// mode used (marker keys are high confidence, fallback is not).
pub fn align_draws<'a>(
    a: &'a [DrawRecord],
    b: &'a [DrawRecord],
) -> (
    Vec<(Option<&'a DrawRecord>, Option<&'a DrawRecord>)>,
    MatchMode,
) {
    let marker_mode = has_markers(a) || has_markers(b);

    if !marker_mode {
        let keys_a = make_fallback_keys(a);
        let keys_b = make_fallback_keys(b);
        let pairs = align_indices(&keys_a, &keys_b)
            .into_iter()
            .map(|(ia, ib)| (ia.map(|i| &a[i]), ib.map(|j| &b[j])))
            .collect();
        return (pairs, MatchMode::Fallback);
    }

    let keys_a = make_match_keys(a);
    let keys_b = make_match_keys(b);

    if a.len() + b.len() <= LCS_SIZE_CUTOFF {
        let pairs = align_indices(&keys_a, &keys_b)
            .into_iter()
            .map(|(ia, ib)| (ia.map(|i| &a[i]), ib.map(|j| &b[j])))
            .collect();
        return (pairs, MatchMode::Marker);
    }

    // Bucket by top-level marker token, preserving first-appearance order,
    // and run LCS within each bucket.
    let mut order: Vec<String> = Vec::new();
    let mut buckets_a: ahash::AHashMap<String, Vec<usize>> = ahash::AHashMap::new();
    let mut buckets_b: ahash::AHashMap<String, Vec<usize>> = ahash::AHashMap::new();
    for (i, r) in a.iter().enumerate() {
        let group = marker_group(&r.marker_path).to_owned();
        if !order.contains(&group) {
            order.push(group.clone());
        }
        buckets_a.entry(group).or_default().push(i);
    }
    for (j, r) in b.iter().enumerate() {
        let group = marker_group(&r.marker_path).to_owned();
        if !order.contains(&group) {
            order.push(group.clone());
        }
        buckets_b.entry(group).or_default().push(j);
    }

    let mut pairs: Vec<(Option<&DrawRecord>, Option<&DrawRecord>)> = Vec::new();
    for group in order {
        let idx_a = buckets_a.remove(&group).unwrap_or_default();
        let idx_b = buckets_b.remove(&group).unwrap_or_default();
        let sub_a: Vec<&(String, String, usize)> = idx_a.iter().map(|&i| &keys_a[i]).collect();
        let sub_b: Vec<&(String, String, usize)> = idx_b.iter().map(|&j| &keys_b[j]).collect();
        for (ia, ib) in align_indices(&sub_a, &sub_b) {
            pairs.push((
                ia.map(|i| &a[idx_a[i]]),
                ib.map(|j| &b[idx_b[j]]),
            ));
        }
    }
    (pairs, MatchMode::Marker)
}
