//! Statistics commands without a running blocker.
//!
//! `pause`, `resume`, `reset` and `status` only touch the state file, so
//! they keep working when nothing listens on the socket.

use anyhow::{Context, Result};
use chrono::Local;

use crate::store::StateStore;
use crate::types::{ResponseData, SessionPhase, SessionStats, StatusSnapshot};

/// Direct access to the state file.
#[derive(Debug, Clone)]
pub struct OfflineStats {
    store: StateStore,
}

impl OfflineStats {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<SessionStats> {
        Ok(self
            .store
            .read()
            .context("Could not read the state file")?
            .unwrap_or_else(|| SessionStats::fresh(Local::now())))
    }

    fn save(&self, stats: &SessionStats) -> Result<()> {
        self.store
            .save(stats)
            .context("Could not write the state file")
    }

    /// Returns false if sessions were already paused.
    pub fn pause(&self) -> Result<bool> {
        let mut stats = self.load()?;
        let changed = stats.pause(Local::now());
        if changed {
            self.save(&stats)?;
        }
        Ok(changed)
    }

    /// Returns false if sessions were not paused.
    pub fn resume(&self) -> Result<bool> {
        let mut stats = self.load()?;
        let changed = stats.resume();
        if changed {
            self.save(&stats)?;
        }
        Ok(changed)
    }

    pub fn reset(&self) -> Result<()> {
        let mut stats = self.load()?;
        stats.reset(Local::now());
        self.save(&stats)
    }

    /// Status as the blocker would report it while idle.
    pub fn status(&self) -> Result<ResponseData> {
        let stats = self.load()?;
        Ok(ResponseData::from_snapshot(&StatusSnapshot {
            phase: SessionPhase::Idle,
            stats,
            remaining_seconds: None,
        }))
    }
}
