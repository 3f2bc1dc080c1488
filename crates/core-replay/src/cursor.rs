//! Seek cache over the replay cursor.
//!
//! Every read-only query implicitly seeks, so the daemon funnels all cursor
//! movement through one [`Cursor`] that skips the FFI call when the replay is
//! already positioned at the requested event. `current()` is what the user
//! observes; multi-seek operations restore it before returning.

use tracing::trace;

use crate::control::{ReplayControl, ReplayError};

#[derive(Debug, thiserror::Error)]
pub enum SeekError {
    #[error("eid {eid} out of range (max: {max})")]
    OutOfRange { eid: u64, max: u64 },
    #[error("{0}")]
    Replay(#[from] ReplayError),
}

#[derive(Debug, Default)]
pub struct Cursor {
    current: u64,
    /// Event the replay itself last moved to; `None` forces the next seek
    /// through to the FFI (used after shader replacement).
    cache: Option<u64>,
    max_eid: u64,
}

impl Cursor {
    pub fn new(max_eid: u64) -> Self {
        Self {
            current: 0,
            cache: None,
            max_eid,
        }
    }

    /// The user-observable cursor position.
    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn max_eid(&self) -> u64 {
        self.max_eid
    }

    /// Position the replay at `eid`. No FFI call when the cached position
    /// already matches.
    pub fn seek(&mut self, replay: &mut dyn ReplayControl, eid: u64) -> Result<(), SeekError> {
        if self.max_eid > 0 && eid > self.max_eid {
            return Err(SeekError::OutOfRange {
                eid,
                max: self.max_eid,
            });
        }
        if self.cache != Some(eid) {
            trace!(target: "replay.cursor", eid, "seek");
            replay.set_frame_event(eid)?;
            self.cache = Some(eid);
        }
        self.current = eid;
        Ok(())
    }

    /// Return to the user's cursor after an operation that seeked elsewhere
    /// internally. An eid of 0 means "no event selected": the observable
    /// position resets without touching the replay.
    pub fn restore_to(&mut self, replay: &mut dyn ReplayControl, eid: u64) -> Result<(), SeekError> {
        if eid != 0 {
            self.seek(replay, eid)
        } else {
            self.current = 0;
            Ok(())
        }
    }

    /// Drop the seek cache so the next seek hits the replay even at the same
    /// event (state behind the cursor changed, e.g. a shader was replaced).
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}
