//! Depth-first flattening of the action tree.

use core_replay::{Action, ActionFlags};

use crate::classify::ActionKind;
use crate::passes::{pass_name_for_eid, PassInfo};

/// One flattened action with its derived context.
#[derive(Debug, Clone)]
pub struct FlatAction {
    pub eid: u64,
    pub flags: ActionFlags,
    pub name: String,
    pub num_indices: u64,
    pub num_instances: u64,
    /// Nearest marker ancestor's name, `"-"` when none.
    pub parent_marker: String,
    /// Enclosing pass window's friendly name, empty when outside any pass.
    pub pass_name: String,
}

impl FlatAction {
    pub fn kind(&self) -> ActionKind {
        ActionKind::of(self.flags)
    }

    pub fn triangles(&self) -> u64 {
        (self.num_indices / 3) * self.num_instances.max(1)
    }
}

/// An action whose name labels its subtree rather than doing work itself.
fn is_marker(action: &Action) -> bool {
    if action.flags.contains(ActionFlags::SET_MARKER) {
        return true;
    }
    let work = ActionFlags::DRAWCALL
        | ActionFlags::MESH_DRAW
        | ActionFlags::MESH_DISPATCH
        | ActionFlags::DISPATCH
        | ActionFlags::CLEAR
        | ActionFlags::COPY
        | ActionFlags::PASS_BOUNDARY
        | ActionFlags::BEGIN_PASS
        | ActionFlags::END_PASS;
    !action.children.is_empty() && !action.flags.intersects(work)
}

fn walk(actions: &[Action], marker: &str, passes: &[PassInfo], out: &mut Vec<FlatAction>) {
    for a in actions {
        out.push(FlatAction {
            eid: a.eid,
            flags: a.flags,
            name: a.name.clone(),
            num_indices: a.num_indices,
            num_instances: a.num_instances,
            parent_marker: marker.to_owned(),
            pass_name: pass_name_for_eid(a.eid, passes).unwrap_or_default(),
        });
        if !a.children.is_empty() {
            let child_marker = if is_marker(a) { a.name.as_str() } else { marker };
            walk(&a.children, child_marker, passes, out);
        }
    }
}

/// Flatten the tree depth-first, annotating each record with its nearest
/// marker ancestor and enclosing pass.
pub fn flatten_actions(actions: &[Action], passes: &[PassInfo]) -> Vec<FlatAction> {
    let mut out = Vec::new();
    walk(actions, "-", passes, &mut out);
    out
}
