//! Scalar counts over the action tree.

use core_replay::Action;

use crate::classify::ActionKind;
use crate::flatten::flatten_actions;
use crate::passes::{build_pass_list, find_pass};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CountError {
    #[error("unknown count target: {0}")]
    UnknownTarget(String),
}

/// Count `events | draws | dispatches | clears | triangles | passes`,
/// optionally restricted to one pass window.
pub fn count_from_actions(
    actions: &[Action],
    what: &str,
    pass_name: Option<&str>,
) -> Result<u64, CountError> {
    let passes = build_pass_list(actions);
    let mut flat = flatten_actions(actions, &passes);

    if let Some(name) = pass_name {
        match find_pass(&passes, name) {
            Some(pass) => flat.retain(|a| a.pass_name == pass.name),
            None => flat.clear(),
        }
    }

    let value = match what {
        "events" => flat.len() as u64,
        "draws" => flat.iter().filter(|a| a.kind().is_draw()).count() as u64,
        "dispatches" => flat
            .iter()
            .filter(|a| a.kind() == ActionKind::Dispatch)
            .count() as u64,
        "clears" => flat.iter().filter(|a| a.kind() == ActionKind::Clear).count() as u64,
        "triangles" => flat
            .iter()
            .filter(|a| a.kind().is_draw())
            .map(|a| a.triangles())
            .sum(),
        "passes" => match pass_name {
            Some(name) => u64::from(find_pass(&passes, name).is_some()),
            None => passes.len() as u64,
        },
        other => return Err(CountError::UnknownTarget(other.to_owned())),
    };
    Ok(value)
}
