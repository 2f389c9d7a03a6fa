//! Shortcut guard error types.
//!
//! Every error here is recoverable: a session keeps running even when the
//! system hotkeys could not be toggled.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while toggling the guarded system hotkeys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortcutGuardError {
    /// The preference tools are not installed (not running on macOS).
    #[error("'{0}' is not available on this system")]
    PlatformUnavailable(String),

    /// A command did not finish in time.
    #[error("'{0}' timed out after {1}s")]
    Timeout(String, u64),

    /// A command exited unsuccessfully or could not be spawned.
    #[error("'{0}' failed: {1}")]
    CommandFailed(String, String),

    /// Some steps of a toggle pass failed; the others were applied.
    #[error("{} hotkey update(s) failed: {}", .0.len(), .0.join("; "))]
    Partial(Vec<String>),

    /// The hotkey preferences file could not be read.
    #[error("Failed to read hotkey preferences {0:?}: {1}")]
    Preferences(PathBuf, String),
}

impl ShortcutGuardError {
    /// Returns true if the platform lacks the preference tools entirely.
    #[must_use]
    pub fn is_platform_unavailable(&self) -> bool {
        matches!(self, Self::PlatformUnavailable(_))
    }

    /// Returns true if the error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_, _))
    }

    /// Shortcut failures never abort a session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::PlatformUnavailable(_) => "System hotkeys can only be guarded on macOS",
            Self::Timeout(_, _) => "The system may be under load; run `fitblock status` to check hotkeys",
            Self::CommandFailed(_, _) | Self::Partial(_) => {
                "Re-enable the hotkeys in System Settings > Keyboard > Keyboard Shortcuts if they stay disabled"
            }
            Self::Preferences(_, _) => "Open System Settings > Keyboard once to recreate the preferences file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timeout() {
        let err = ShortcutGuardError::Timeout("defaults".to_string(), 5);
        assert_eq!(err.to_string(), "'defaults' timed out after 5s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_display_partial() {
        let err = ShortcutGuardError::Partial(vec![
            "hotkey 52: exit status 1".to_string(),
            "killall: no matching processes".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("2 hotkey update(s) failed"));
        assert!(message.contains("hotkey 52"));
        assert!(message.contains("killall"));
    }

    #[test]
    fn test_all_errors_recoverable() {
        let errors = vec![
            ShortcutGuardError::PlatformUnavailable("defaults".into()),
            ShortcutGuardError::Timeout("defaults".into(), 5),
            ShortcutGuardError::CommandFailed("defaults".into(), "boom".into()),
            ShortcutGuardError::Partial(vec!["x".into()]),
            ShortcutGuardError::Preferences(PathBuf::from("/tmp/x.plist"), "bad".into()),
        ];

        for error in errors {
            assert!(error.is_recoverable());
            assert!(!error.suggestion().is_empty());
        }
    }

    #[test]
    fn test_is_platform_unavailable() {
        assert!(ShortcutGuardError::PlatformUnavailable("defaults".into()).is_platform_unavailable());
        assert!(!ShortcutGuardError::Timeout("defaults".into(), 1).is_platform_unavailable());
    }
}
