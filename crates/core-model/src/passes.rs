//! Pass table derivation.
//!
//! A pass is a top-level `[BeginPass … EndPass]` window that contains at
//! least one draw or dispatch. Work is counted structurally (the begin
//! node's subtree plus window siblings); the `[begin_eid, end_eid]` window
//! is what dependency analysis and pass-name lookup key on.

use core_replay::{Action, ActionFlags};

use crate::classify::{is_work, ActionKind};

#[derive(Debug, Clone, Default)]
pub struct PassInfo {
    /// Friendly name, disambiguated when captures repeat marker names.
    pub name: String,
    /// Name as recorded in the capture.
    pub original_name: String,
    pub begin_eid: u64,
    pub end_eid: u64,
    pub draws: u64,
    pub dispatches: u64,
    pub triangles: u64,
    /// Draw/dispatch eids inside the pass, in event order.
    pub draw_eids: Vec<u64>,
}

fn tally(actions: &[Action], pass: &mut PassInfo) {
    for a in actions {
        let kind = ActionKind::of(a.flags);
        if kind.is_draw() {
            pass.draws += 1;
            pass.triangles += a.triangles();
            pass.draw_eids.push(a.eid);
        } else if kind == ActionKind::Dispatch {
            pass.dispatches += 1;
            pass.draw_eids.push(a.eid);
        }
        tally(&a.children, pass);
    }
}

/// Scan top-level actions into the pass list. Windows with no work are
/// discarded (marker-only boundaries do not emit a pass).
pub fn build_pass_list(actions: &[Action]) -> Vec<PassInfo> {
    let mut passes: Vec<PassInfo> = Vec::new();
    let mut open: Option<PassInfo> = None;

    for a in actions {
        if a.flags.contains(ActionFlags::BEGIN_PASS) {
            // An unterminated window is dropped when a new one opens.
            let mut pass = PassInfo {
                name: a.name.clone(),
                original_name: a.name.clone(),
                begin_eid: a.eid,
                end_eid: a.eid,
                ..PassInfo::default()
            };
            tally(&a.children, &mut pass);
            open = Some(pass);
        } else if a.flags.contains(ActionFlags::END_PASS) {
            if let Some(mut pass) = open.take() {
                pass.end_eid = a.eid;
                if pass.draws + pass.dispatches > 0 {
                    passes.push(pass);
                }
            }
        } else if let Some(pass) = open.as_mut() {
            // Work recorded as a window sibling rather than a child.
            if is_work(a.flags) || !a.children.is_empty() {
                tally(std::slice::from_ref(a), pass);
            }
        }
    }

    disambiguate(&mut passes);
    passes
}

/// Append ` #1`, ` #2`, … to repeated names so VFS paths stay unique. The
/// first occurrence keeps the bare name.
fn disambiguate(passes: &mut [PassInfo]) {
    use std::collections::HashMap;
    let mut seen: HashMap<String, u32> = HashMap::new();
    for pass in passes.iter_mut() {
        let count = seen.entry(pass.original_name.clone()).or_insert(0);
        if *count > 0 {
            pass.name = format!("{} #{}", pass.original_name, count);
        }
        *count += 1;
    }
}

/// Friendly name of the pass whose window contains `eid`.
pub fn pass_name_for_eid(eid: u64, passes: &[PassInfo]) -> Option<String> {
    passes
        .iter()
        .find(|p| p.begin_eid <= eid && eid <= p.end_eid)
        .map(|p| p.name.clone())
}

/// Resolve a pass by friendly name (case-insensitive) or original name.
pub fn find_pass<'a>(passes: &'a [PassInfo], name: &str) -> Option<&'a PassInfo> {
    passes
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name) || p.original_name.eq_ignore_ascii_case(name))
}
