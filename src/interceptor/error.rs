//! Input interceptor error types.

use thiserror::Error;

/// Errors that can occur while installing the input interceptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterceptorError {
    /// The process lacks the Accessibility permission required for event taps.
    #[error("Accessibility permission denied; input cannot be intercepted")]
    PermissionDenied,

    /// Input interception is not implemented on this platform.
    #[error("Input interception is not available on this platform")]
    PlatformUnavailable,

    /// The event-tap worker could not be started.
    #[error("Event tap worker failed: {0}")]
    WorkerFailed(String),
}

impl InterceptorError {
    /// Returns true if the error is due to a missing permission.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// A session degrades to visual-only blocking on every interceptor error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Grant Accessibility access in System Settings > Privacy & Security > Accessibility"
            }
            Self::PlatformUnavailable => "Input blocking requires macOS",
            Self::WorkerFailed(_) => "Restart fitblock; if this persists, check the system log",
        }
    }
}
