//! Error types for state persistence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// State file error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the state file.
    #[error("Failed to read state file {0:?}: {1}")]
    Read(PathBuf, #[source] io::Error),

    /// The state file is not valid JSON or misses required fields.
    #[error("Failed to parse state file {0:?}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),

    /// Failed to serialize the statistics.
    #[error("Failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to write the state file.
    #[error("Failed to write state file {0:?}: {1}")]
    Write(PathBuf, #[source] io::Error),
}

impl StoreError {
    /// Persistence failures never stop the process; in-memory state stays
    /// authoritative.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Read(_, _) | Self::Write(_, _) => {
                "Check the permissions of the state file and its directory"
            }
            Self::Parse(_, _) => "Fix or delete the state file; it is recreated on next save",
            Self::Serialize(_) => "Report this as a bug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_read() {
        let err = StoreError::Read(
            PathBuf::from("/tmp/state.json"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("state.json"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_display_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::Parse(PathBuf::from("/tmp/state.json"), json_err);
        assert!(err.to_string().starts_with("Failed to parse state file"));
        assert!(err.suggestion().contains("delete"));
    }
}
