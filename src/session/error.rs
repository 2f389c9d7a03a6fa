//! Session controller error types.

use thiserror::Error;

use crate::types::SessionPhase;

/// Errors returned by the session controller's public operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already in progress.
    #[error("A blocking session is already active")]
    AlreadyActive,

    /// Sessions are paused; nothing was started.
    #[error("Sessions are paused")]
    Paused,

    /// The operation is only allowed while no session is running.
    #[error("Not allowed while a session is {0}")]
    NotIdle(SessionPhase),
}

impl SessionError {
    /// Returns true if the caller can simply retry later.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AlreadyActive => "Wait for the current session to finish",
            Self::Paused => "Run `fitblock resume` to allow sessions again",
            Self::NotIdle(_) => "Try again once the current session has finished",
        }
    }
}
