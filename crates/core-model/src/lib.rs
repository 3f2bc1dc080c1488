//! Action-tree derived tables: classification, flattening, passes, counts.
//!
//! Everything here is pure over the owned action tree — no cursor movement,
//! no replay access beyond the data already materialized at open. Derived
//! tables are read-only after build.

pub mod classify;
pub mod count;
pub mod flatten;
pub mod passes;

pub use classify::{is_work, ActionKind};
pub use count::{count_from_actions, CountError};
pub use flatten::{flatten_actions, FlatAction};
pub use passes::{build_pass_list, find_pass, pass_name_for_eid, PassInfo};

use core_replay::Action;

/// Largest event id in the tree (0 for an empty capture).
pub fn max_eid(actions: &[Action]) -> u64 {
    let mut result = 0;
    for a in actions {
        result = result.max(a.eid).max(max_eid(&a.children));
    }
    result
}

/// Depth-first lookup of an action by event id.
pub fn find_action<'a>(actions: &'a [Action], eid: u64) -> Option<&'a Action> {
    for a in actions {
        if a.eid == eid {
            return Some(a);
        }
        if let Some(found) = find_action(&a.children, eid) {
            return Some(found);
        }
    }
    None
}
