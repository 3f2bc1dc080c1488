//! Action classification by flag word.

use core_replay::ActionFlags;

/// The fixed classification set. Mesh draws and mesh dispatches always land
/// in the draw buckets; they must never count as dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Draw,
    DrawIndexed,
    Dispatch,
    Clear,
    Copy,
    BeginPass,
    EndPass,
    Other,
}

impl ActionKind {
    pub fn of(flags: ActionFlags) -> ActionKind {
        let drawish = ActionFlags::DRAWCALL | ActionFlags::MESH_DRAW | ActionFlags::MESH_DISPATCH;
        if flags.intersects(drawish) {
            if flags.contains(ActionFlags::INDEXED) {
                ActionKind::DrawIndexed
            } else {
                ActionKind::Draw
            }
        } else if flags.contains(ActionFlags::DISPATCH) {
            ActionKind::Dispatch
        } else if flags.contains(ActionFlags::CLEAR) {
            ActionKind::Clear
        } else if flags.contains(ActionFlags::COPY) {
            ActionKind::Copy
        } else if flags.contains(ActionFlags::BEGIN_PASS) {
            ActionKind::BeginPass
        } else if flags.contains(ActionFlags::END_PASS) {
            ActionKind::EndPass
        } else {
            ActionKind::Other
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Draw => "Draw",
            ActionKind::DrawIndexed => "DrawIndexed",
            ActionKind::Dispatch => "Dispatch",
            ActionKind::Clear => "Clear",
            ActionKind::Copy => "Copy",
            ActionKind::BeginPass => "BeginPass",
            ActionKind::EndPass => "EndPass",
            ActionKind::Other => "Other",
        }
    }

    pub fn is_draw(self) -> bool {
        matches!(self, ActionKind::Draw | ActionKind::DrawIndexed)
    }
}

/// True when the action submits GPU work (draw, mesh draw, or dispatch).
pub fn is_work(flags: ActionFlags) -> bool {
    flags.intersects(
        ActionFlags::DRAWCALL
            | ActionFlags::MESH_DRAW
            | ActionFlags::MESH_DISPATCH
            | ActionFlags::DISPATCH,
    )
}
