//! Persistence of [`SessionStats`].
//!
//! Statistics live in a small JSON document at a well-known path. Writes go
//! to a sibling temp file that is renamed into place, so a crash mid-write
//! never leaves a truncated state file behind.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::types::SessionStats;

pub use error::StoreError;

/// How a load resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The state file existed and parsed
    Loaded,
    /// No state file; fresh stats were created and saved
    FirstRun,
    /// The state file was unusable; fresh in-memory stats are in use
    Recovered(String),
}

/// JSON-backed statistics store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    owner: Option<u32>,
}

impl StateStore {
    /// Creates a store for the given state file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owner: None,
        }
    }

    /// Hands every saved file to the given user.
    ///
    /// The elevated daemon runs as root; without this the state file would
    /// end up owned by root after the first save.
    #[must_use]
    pub fn with_owner(mut self, uid: Option<u32>) -> Self {
        self.owner = uid;
        self
    }

    /// Returns the state file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn read(&self) -> Result<Option<SessionStats>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Read(self.path.clone(), e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Parse(self.path.clone(), e))
    }

    /// Writes the statistics atomically.
    pub fn save(&self, stats: &SessionStats) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Write(self.path.clone(), e))?;
            }
        }

        let json = serde_json::to_string_pretty(stats).map_err(StoreError::Serialize)?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| StoreError::Write(tmp.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write(self.path.clone(), e)
        })?;

        #[cfg(unix)]
        if let Some(uid) = self.owner {
            if let Err(e) = std::os::unix::fs::chown(&self.path, Some(uid), None) {
                tracing::warn!("Could not hand {:?} to uid {}: {}", self.path, uid, e);
            }
        }

        tracing::debug!("Saved state to {:?}", self.path);
        Ok(())
    }

    /// Loads statistics, never failing.
    ///
    /// - Missing file: fresh stats, saved immediately.
    /// - Unreadable or corrupt file: fresh stats kept in memory only, so the
    ///   broken file stays on disk for inspection until the next save.
    pub fn load(&self) -> (SessionStats, LoadOutcome) {
        match self.read() {
            Ok(Some(stats)) => {
                tracing::info!(
                    "Loaded state: {} sessions completed since {}",
                    stats.sessions_completed,
                    stats.first_started_at
                );
                (stats, LoadOutcome::Loaded)
            }
            Ok(None) => {
                let stats = SessionStats::fresh(Local::now());
                if let Err(e) = self.save(&stats) {
                    tracing::warn!("Could not save initial state: {}", e);
                }
                tracing::info!("First run - initialized state at {:?}", self.path);
                (stats, LoadOutcome::FirstRun)
            }
            Err(e) => {
                tracing::warn!("Error loading state, starting fresh: {}", e);
                (SessionStats::fresh(Local::now()), LoadOutcome::Recovered(e.to_string()))
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_read_missing_file() {
        let (_dir, store) = temp_store();
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_load_first_run_creates_file() {
        let (_dir, store) = temp_store();

        let (stats, outcome) = store.load();

        assert_eq!(outcome, LoadOutcome::FirstRun);
        assert_eq!(stats.sessions_completed, 0);
        assert!(!stats.paused);
        assert!(store.path().exists());
        assert_eq!(store.read().unwrap(), Some(stats));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_dir, store) = temp_store();
        let now = Local::now();

        let mut stats = SessionStats::fresh(now - Duration::days(2));
        stats.sessions_completed = 17;
        stats.begin_session(now);
        stats.pause(now + Duration::seconds(1));

        store.save(&stats).unwrap();
        let (loaded, outcome) = store.load();

        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(loaded, stats);
    }

    #[test]
    fn test_load_corrupt_file_falls_back() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ definitely not json").unwrap();

        let (stats, outcome) = store.load();

        assert!(matches!(outcome, LoadOutcome::Recovered(_)));
        assert_eq!(stats.sessions_completed, 0);
        // The broken file is left untouched
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "{ definitely not json"
        );
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        store.save(&SessionStats::fresh(Local::now())).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (dir, store) = temp_store();
        store.save(&SessionStats::fresh(Local::now())).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("state.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_with_owner() {
        use std::os::unix::fs::MetadataExt;

        let (_dir, store) = temp_store();
        let uid = unsafe { libc::getuid() };
        let store = store.with_owner(Some(uid));

        store.save(&SessionStats::fresh(Local::now())).unwrap();
        assert_eq!(fs::metadata(store.path()).unwrap().uid(), uid);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let (dir, _) = temp_store();
        // A regular file cannot act as a parent directory
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = StateStore::new(blocker.join("state.json"));

        let err = store.save(&SessionStats::fresh(Local::now())).unwrap_err();
        assert!(matches!(err, StoreError::Write(_, _)));
        assert!(err.is_recoverable());
    }
}
