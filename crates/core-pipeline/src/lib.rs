//! Pipeline snapshot views and buffer decoding.
//!
//! Pure functions from a [`core_replay::PipeSnapshot`] (already seeked by the
//! caller) to JSON rows. The daemon owns the seek; nothing here touches the
//! cursor, which keeps every section extractor trivially testable.

pub mod decode;
pub mod sections;
pub mod summary;

pub use decode::{decode_ibuffer, decode_mesh, decode_vbuffers, flatten_cbuffer_vars};
pub use sections::{section_row, Section};
pub use summary::{bindings_rows, pipeline_row, shader_row, stage_rows};

use serde_json::{json, Value};

/// Render the replay's "whole buffer" byte-size sentinel as `"-"`.
pub fn sanitize_size(v: u64) -> Value {
    if v >= core_replay::SIZE_SENTINEL {
        json!("-")
    } else {
        json!(v)
    }
}
