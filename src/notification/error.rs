//! Notification error types.
//!
//! Notifications are a best-effort side channel: callers log these errors at
//! debug level and carry on.

use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// No notification backend is installed.
    #[error("No notification backend is available")]
    NotAvailable,

    /// Notifications are switched off in the configuration.
    #[error("Notifications are disabled")]
    Disabled,

    /// The backend command failed.
    #[error("Failed to send notification via {0}: {1}")]
    SendFailed(String, String),

    /// The backend command did not finish in time.
    #[error("Notification via {0} timed out after {1}s")]
    Timeout(String, u64),
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotAvailable => "Install terminal-notifier (brew install terminal-notifier)",
            Self::Disabled => "Set \"notifications\": true in ~/.fitblock/config.json",
            Self::SendFailed(_, _) | Self::Timeout(_, _) => {
                "Check System Settings > Notifications for the sending app"
            }
        }
    }

    /// Notification failures never affect a session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
