//! Resource table comparison.
//!
//! Named resources match case-insensitively; when the same name appears
//! more than once on a side, the first occurrence claims the name and the
//! rest fall back to the unnamed bucket. Unnamed resources match
//! positionally per type at low confidence.

use serde_json::{json, Value};

use crate::draws::DiffStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: u64,
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDiffRow {
    pub status: DiffStatus,
    pub confidence: &'static str,
    pub name: String,
    pub id_a: Option<u64>,
    pub id_b: Option<u64>,
    pub type_a: Option<String>,
    pub type_b: Option<String>,
}

impl ResourceDiffRow {
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status.name(),
            "confidence": self.confidence,
            "name": self.name,
            "id_a": self.id_a,
            "id_b": self.id_b,
            "type_a": self.type_a,
            "type_b": self.type_b,
        })
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Split into (named first-occurrences, remainder). Duplicate names and
/// empty names land in the remainder.
fn split_named(records: &[ResourceRecord]) -> (Vec<&ResourceRecord>, Vec<&ResourceRecord>) {
    let mut seen: ahash::AHashSet<String> = ahash::AHashSet::new();
    let mut named = Vec::new();
    let mut unnamed = Vec::new();
    for r in records {
        let key = name_key(&r.name);
        if key.is_empty() || !seen.insert(key) {
            unnamed.push(r);
        } else {
            named.push(r);
        }
    }
    (named, unnamed)
}

pub fn diff_resources(a: &[ResourceRecord], b: &[ResourceRecord]) -> Vec<ResourceDiffRow> {
    let (named_a, mut rest_a) = split_named(a);
    let (named_b, mut rest_b) = split_named(b);

    let mut rows: Vec<ResourceDiffRow> = Vec::new();
    let mut matched_b: ahash::AHashSet<u64> = ahash::AHashSet::new();

    for &ra in &named_a {
        match named_b
            .iter()
            .copied()
            .find(|rb| name_key(&rb.name) == name_key(&ra.name))
        {
            Some(rb) => {
                matched_b.insert(rb.id);
                let status = if ra.ty == rb.ty {
                    DiffStatus::Equal
                } else {
                    DiffStatus::Modified
                };
                rows.push(ResourceDiffRow {
                    status,
                    confidence: "high",
                    name: ra.name.clone(),
                    id_a: Some(ra.id),
                    id_b: Some(rb.id),
                    type_a: Some(ra.ty.clone()),
                    type_b: Some(rb.ty.clone()),
                });
            }
            None => rest_a.push(ra),
        }
    }
    for &rb in &named_b {
        if !matched_b.contains(&rb.id) {
            rest_b.push(rb);
        }
    }

    // Positional matching per type for everything without a usable name.
    let mut types: Vec<String> = Vec::new();
    for r in rest_a.iter().chain(rest_b.iter()) {
        if !types.contains(&r.ty) {
            types.push(r.ty.clone());
        }
    }
    for ty in types {
        let of_a: Vec<&ResourceRecord> = rest_a.iter().copied().filter(|r| r.ty == ty).collect();
        let of_b: Vec<&ResourceRecord> = rest_b.iter().copied().filter(|r| r.ty == ty).collect();
        let len = of_a.len().max(of_b.len());
        for i in 0..len {
            let ra = of_a.get(i).copied();
            let rb = of_b.get(i).copied();
            let status = match (ra, rb) {
                (Some(_), Some(_)) => DiffStatus::Equal,
                (Some(_), None) => DiffStatus::Deleted,
                (None, Some(_)) => DiffStatus::Added,
                (None, None) => continue,
            };
            let name = ra
                .map(|r| r.name.clone())
                .or_else(|| rb.map(|r| r.name.clone()))
                .unwrap_or_default();
            rows.push(ResourceDiffRow {
                status,
                confidence: "low",
                name,
                id_a: ra.map(|r| r.id),
                id_b: rb.map(|r| r.id),
                type_a: ra.map(|r| r.ty.clone()),
                type_b: rb.map(|r| r.ty.clone()),
            });
        }
    }

    rows
}
