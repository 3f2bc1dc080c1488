//! Regex search over cached shader disassembly.

use regex::RegexBuilder;
use serde_json::{json, Value};

use core_shaders::ShaderCache;

pub const MAX_PATTERN_LEN: usize = 500;
pub const DEFAULT_LIMIT: usize = 200;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("missing pattern")]
    EmptyPattern,
    #[error("pattern too long (max {MAX_PATTERN_LEN})")]
    PatternTooLong,
    #[error("invalid regex: {0}")]
    BadPattern(String),
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub pattern: String,
    pub stage: Option<core_replay::Stage>,
    pub case_sensitive: bool,
    pub limit: usize,
    pub context: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            stage: None,
            case_sensitive: false,
            limit: DEFAULT_LIMIT,
            context: 0,
        }
    }
}

/// Scan every cached disassembly line for the pattern. Shaders iterate in id
/// order so output is stable within a session; truncation at `limit` is
/// reported, not silent.
pub fn search_disasm(cache: &ShaderCache, opts: &SearchOptions) -> Result<Value, SearchError> {
    if opts.pattern.is_empty() {
        return Err(SearchError::EmptyPattern);
    }
    if opts.pattern.len() > MAX_PATTERN_LEN {
        return Err(SearchError::PatternTooLong);
    }
    let re = RegexBuilder::new(&opts.pattern)
        .case_insensitive(!opts.case_sensitive)
        .build()
        .map_err(|e| SearchError::BadPattern(e.to_string()))?;

    let limit = opts.limit.max(1);
    let mut shader_ids: Vec<u64> = cache.disasm.keys().copied().collect();
    shader_ids.sort_unstable();

    let mut matches: Vec<Value> = Vec::new();
    let mut truncated = false;

    'shaders: for sid in shader_ids {
        let stages: Vec<&str> = cache
            .meta
            .get(&sid)
            .map(|m| m.stages.iter().map(|s| s.name()).collect())
            .unwrap_or_default();
        if let Some(stage) = opts.stage {
            if !stages.contains(&stage.name()) {
                continue;
            }
        }
        let first_eid = cache.meta.get(&sid).map(|m| m.first_eid).unwrap_or(0);
        let text = &cache.disasm[&sid];
        let lines: Vec<&str> = text.lines().collect();
        for (lineno, line) in lines.iter().enumerate() {
            if !re.is_match(line) {
                continue;
            }
            let before_start = lineno.saturating_sub(opts.context);
            let after_end = (lineno + 1 + opts.context).min(lines.len());
            matches.push(json!({
                "shader": sid,
                "stages": stages,
                "first_eid": first_eid,
                "line": lineno + 1,
                "text": line,
                "context_before": &lines[before_start..lineno],
                "context_after": &lines[lineno + 1..after_end],
            }));
            if matches.len() >= limit {
                truncated = true;
                break 'shaders;
            }
        }
    }

    Ok(json!({"matches": matches, "truncated": truncated}))
}
