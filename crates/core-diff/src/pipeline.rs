//! Pipeline section comparison between two captures.

use serde_json::{Map, Value};

use crate::alignment::DrawRecord;

/// The thirteen section RPCs issued per aligned draw: `(method, key)`.
pub const PIPE_SECTION_CALLS: [(&str, &str); 13] = [
    ("pipe_topology", "topology"),
    ("pipe_viewport", "viewport"),
    ("pipe_scissor", "scissor"),
    ("pipe_blend", "blend"),
    ("pipe_stencil", "stencil"),
    ("pipe_vinputs", "vinputs"),
    ("pipe_samplers", "samplers"),
    ("pipe_vbuffers", "vbuffers"),
    ("pipe_ibuffer", "ibuffer"),
    ("pipe_push_constants", "push_constants"),
    ("pipe_rasterizer", "rasterizer"),
    ("pipe_depth_stencil", "depth_stencil"),
    ("pipe_msaa", "msaa"),
];

/// Sections whose payload is a list under the given key.
const LIST_SECTIONS: [(&str, &str); 5] = [
    ("blend", "blends"),
    ("vinputs", "inputs"),
    ("samplers", "samplers"),
    ("vbuffers", "vbuffers"),
    ("push_constants", "push_constants"),
];

/// Sections with one level of nested dict sub-fields.
const NESTED_SECTIONS: [&str; 1] = ["stencil"];

#[derive(Debug, Clone, PartialEq)]
pub struct PipeFieldDiff {
    pub section: String,
    pub field: String,
    pub value_a: Value,
    pub value_b: Value,
    pub changed: bool,
}

impl PipeFieldDiff {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "section": self.section,
            "field": self.field,
            "value_a": self.value_a,
            "value_b": self.value_b,
            "changed": self.changed,
        })
    }
}

fn strip_eid(d: &Map<String, Value>) -> Map<String, Value> {
    d.iter()
        .filter(|(k, _)| k.as_str() != "eid")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn merged_keys(a: &Map<String, Value>, b: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = a.keys().cloned().collect();
    for k in b.keys() {
        if !keys.contains(k) {
            keys.push(k.clone());
        }
    }
    keys
}

fn push_field(out: &mut Vec<PipeFieldDiff>, section: &str, field: String, va: Value, vb: Value) {
    let changed = va != vb;
    out.push(PipeFieldDiff {
        section: section.to_owned(),
        field,
        value_a: va,
        value_b: vb,
        changed,
    });
}

fn diff_flat(section: &str, da: &Map<String, Value>, db: &Map<String, Value>) -> Vec<PipeFieldDiff> {
    let a = strip_eid(da);
    let b = strip_eid(db);
    let mut out = Vec::new();
    for key in merged_keys(&a, &b) {
        let va = a.get(&key).cloned().unwrap_or(Value::Null);
        let vb = b.get(&key).cloned().unwrap_or(Value::Null);
        push_field(&mut out, section, key, va, vb);
    }
    out
}

fn diff_nested(
    section: &str,
    da: &Map<String, Value>,
    db: &Map<String, Value>,
) -> Vec<PipeFieldDiff> {
    let a = strip_eid(da);
    let b = strip_eid(db);
    let mut out = Vec::new();
    for key in merged_keys(&a, &b) {
        let va = a.get(&key).cloned().unwrap_or(Value::Null);
        let vb = b.get(&key).cloned().unwrap_or(Value::Null);
        match (va.as_object(), vb.as_object()) {
            (Some(oa), Some(ob)) => {
                for sub in merged_keys(oa, ob) {
                    let sva = oa.get(&sub).cloned().unwrap_or(Value::Null);
                    let svb = ob.get(&sub).cloned().unwrap_or(Value::Null);
                    push_field(&mut out, section, format!("{key}.{sub}"), sva, svb);
                }
            }
            _ => push_field(&mut out, section, key, va, vb),
        }
    }
    out
}

fn diff_list(
    section: &str,
    list_key: &str,
    da: &Map<String, Value>,
    db: &Map<String, Value>,
) -> Vec<PipeFieldDiff> {
    let empty = Vec::new();
    let list_a = da.get(list_key).and_then(Value::as_array).unwrap_or(&empty);
    let list_b = db.get(list_key).and_then(Value::as_array).unwrap_or(&empty);
    let mut out = Vec::new();

    if list_a.len() != list_b.len() {
        push_field(
            &mut out,
            section,
            "count".to_owned(),
            Value::from(list_a.len()),
            Value::from(list_b.len()),
        );
    }

    for i in 0..list_a.len().min(list_b.len()) {
        let (Some(ea), Some(eb)) = (list_a[i].as_object(), list_b[i].as_object()) else {
            continue;
        };
        for key in merged_keys(ea, eb) {
            let va = ea.get(&key).cloned().unwrap_or(Value::Null);
            let vb = eb.get(&key).cloned().unwrap_or(Value::Null);
            push_field(&mut out, section, format!("{list_key}[{i}].{key}"), va, vb);
        }
    }
    out
}

/// Compare per-section RPC results from both captures. Either side of a
/// section may be missing (that section is skipped).
pub fn diff_pipeline_sections(
    results_a: &[Option<Value>],
    results_b: &[Option<Value>],
    section_names: Option<&[&str]>,
) -> Vec<PipeFieldDiff> {
    let default_names: Vec<&str> = PIPE_SECTION_CALLS.iter().map(|(_, key)| *key).collect();
    let names = section_names.unwrap_or(&default_names);

    let mut out = Vec::new();
    for (i, section) in names.iter().enumerate() {
        let (Some(ra), Some(rb)) = (
            results_a.get(i).and_then(Option::as_ref),
            results_b.get(i).and_then(Option::as_ref),
        ) else {
            continue;
        };
        // Accept either a bare payload or a full JSON-RPC response.
        let da = ra.get("result").unwrap_or(ra);
        let db = rb.get("result").unwrap_or(rb);
        let (Some(da), Some(db)) = (da.as_object(), db.as_object()) else {
            continue;
        };

        if let Some((_, list_key)) = LIST_SECTIONS.iter().find(|(s, _)| s == section) {
            out.extend(diff_list(section, list_key, da, db));
        } else if NESTED_SECTIONS.contains(section) {
            out.extend(diff_nested(section, da, db));
        } else {
            out.extend(diff_flat(section, da, db));
        }
    }
    out
}

/// Locate the aligned pair for a marker path, honoring a `marker[N]` index
/// suffix. Returns the pair and a non-empty warning when duplicates exist
/// and no index was given.
pub fn find_aligned_pair<'a>(
    aligned: &'a [(Option<DrawRecord>, Option<DrawRecord>)],
    marker_path: &str,
) -> Result<(&'a (Option<DrawRecord>, Option<DrawRecord>), String), String> {
    let (base_marker, target_idx) = parse_marker_index(marker_path);

    let matches: Vec<&(Option<DrawRecord>, Option<DrawRecord>)> = aligned
        .iter()
        .filter(|(a, b)| {
            a.as_ref().is_some_and(|r| r.marker_path == base_marker)
                || b.as_ref().is_some_and(|r| r.marker_path == base_marker)
        })
        .collect();

    if matches.is_empty() {
        return Err(format!("marker '{base_marker}' not found in either capture"));
    }
    if target_idx >= matches.len() {
        let plural = if matches.len() == 1 { "" } else { "s" };
        return Err(format!(
            "marker '{base_marker}' index [{target_idx}] out of range (only {} occurrence{plural})",
            matches.len()
        ));
    }

    let pair = matches[target_idx];
    let explicit_index = marker_path != base_marker;
    let warning = if !explicit_index && matches.len() > 1 {
        format!(
            "marker '{base_marker}' appears {} times; using index [0]",
            matches.len()
        )
    } else {
        String::new()
    };

    if pair.0.is_none() {
        return Err(format!("marker '{base_marker}' not found in capture A"));
    }
    if pair.1.is_none() {
        return Err(format!("marker '{base_marker}' not found in capture B"));
    }
    Ok((pair, warning))
}

fn parse_marker_index(marker_path: &str) -> (&str, usize) {
    if let Some(stripped) = marker_path.strip_suffix(']') {
        if let Some(open) = stripped.rfind('[') {
            if let Ok(idx) = stripped[open + 1..].parse::<usize>() {
                return (&marker_path[..open], idx);
            }
        }
    }
    (marker_path, 0)
}
