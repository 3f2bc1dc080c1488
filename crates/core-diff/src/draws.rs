//! Draw-pair classification.

use serde_json::{json, Value};

use crate::alignment::{align_draws, DrawRecord, MatchMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    Equal,
    Modified,
    Added,
    Deleted,
}

impl DiffStatus {
    pub fn name(self) -> &'static str {
        match self {
            DiffStatus::Equal => "EQUAL",
            DiffStatus::Modified => "MODIFIED",
            DiffStatus::Added => "ADDED",
            DiffStatus::Deleted => "DELETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawDiffRow {
    pub status: DiffStatus,
    pub confidence: &'static str,
    pub marker: String,
    pub draw_type: String,
    pub eid_a: Option<u64>,
    pub eid_b: Option<u64>,
    pub triangles_a: Option<u64>,
    pub triangles_b: Option<u64>,
    pub instances_a: Option<u64>,
    pub instances_b: Option<u64>,
}

impl DrawDiffRow {
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status.name(),
            "confidence": self.confidence,
            "marker": self.marker,
            "type": self.draw_type,
            "eid_a": self.eid_a,
            "eid_b": self.eid_b,
            "triangles_a": self.triangles_a,
            "triangles_b": self.triangles_b,
            "instances_a": self.instances_a,
            "instances_b": self.instances_b,
        })
    }
}

/// Classify one aligned pair. At least one side must be present.
pub fn compare_draw_pair(
    a: Option<&DrawRecord>,
    b: Option<&DrawRecord>,
    confidence: &'static str,
) -> DrawDiffRow {
    let template = a.or(b).expect("aligned pair with both sides absent");
    let status = match (a, b) {
        (Some(ra), Some(rb)) => {
            if ra.triangles == rb.triangles
                && ra.instances == rb.instances
                && ra.draw_type == rb.draw_type
            {
                DiffStatus::Equal
            } else {
                DiffStatus::Modified
            }
        }
        (None, Some(_)) => DiffStatus::Added,
        (Some(_), None) => DiffStatus::Deleted,
        (None, None) => unreachable!(),
    };
    DrawDiffRow {
        status,
        confidence,
        marker: template.marker_path.clone(),
        draw_type: template.draw_type.clone(),
        eid_a: a.map(|r| r.eid),
        eid_b: b.map(|r| r.eid),
        triangles_a: a.map(|r| r.triangles),
        triangles_b: b.map(|r| r.triangles),
        instances_a: a.map(|r| r.instances),
        instances_b: b.map(|r| r.instances),
    }
}

/// Align and classify two draw sequences.
pub fn diff_draws(a: &[DrawRecord], b: &[DrawRecord]) -> Vec<DrawDiffRow> {
    let (pairs, mode) = align_draws(a, b);
    let confidence = match mode {
        MatchMode::Marker => "high",
        MatchMode::Fallback => "medium",
    };
    pairs
        .into_iter()
        .map(|(ra, rb)| compare_draw_pair(ra, rb, confidence))
        .collect()
}
