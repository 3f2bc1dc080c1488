//! Comparing two captures: alignment, per-domain diffs, and the
//! two-daemon query fan-out.

pub mod alignment;
pub mod draws;
pub mod launch;
pub mod pipeline;
pub mod resources;
pub mod service;
pub mod stats;

pub use alignment::{
    align_draws, build_draw_records, has_markers, lcs_align, make_fallback_keys, make_match_keys,
    DrawRecord, MatchMode,
};
pub use draws::{compare_draw_pair, diff_draws, DiffStatus, DrawDiffRow};
pub use launch::{exit_code, DiffSession};
pub use pipeline::{diff_pipeline_sections, find_aligned_pair, PipeFieldDiff, PIPE_SECTION_CALLS};
pub use resources::{diff_resources, ResourceDiffRow, ResourceRecord};
pub use service::{query_both, query_both_sync, DiffContext, DIFF_IDLE_TIMEOUT_SECS};
pub use stats::{diff_stats, PassRow, PassDiffRow};
