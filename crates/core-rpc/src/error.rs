//! Error taxonomy shared across the daemon boundary.
//!
//! Failures cross the wire as `{code, message}`, never as host-language
//! error types. The kind → code mapping is fixed protocol surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    MethodNotFound,
    InvalidArgs,
    NoSession,
    NoReplay,
    Unauthorized,
    NotFound,
    OutOfRange,
    ResourceMissing,
    DecodeFailed,
    DebugNotAvailable,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> i64 {
        match self {
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidArgs => -32602,
            ErrorKind::NoSession | ErrorKind::NoReplay | ErrorKind::Unauthorized => -32002,
            // Seeks past the capture end and failed exports report like a
            // missing replay precondition, matching the wire contract.
            ErrorKind::OutOfRange | ErrorKind::DecodeFailed => -32002,
            ErrorKind::NotFound | ErrorKind::ResourceMissing => -32001,
            ErrorKind::DebugNotAvailable => -32007,
            ErrorKind::Internal => -32603,
        }
    }
}

/// A handler failure ready for the wire.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RpcError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RpcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgs, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn no_replay() -> Self {
        Self::new(ErrorKind::NoReplay, "no replay loaded")
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "invalid or missing token")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn debug_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DebugNotAvailable, message)
    }

    pub fn code(&self) -> i64 {
        self.kind.code()
    }
}
