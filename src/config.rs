//! Runtime configuration and well-known paths.
//!
//! The block duration is a compile-time constant. Everything else is read
//! from an optional JSON file; missing fields fall back to their defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Length of one blocking session in seconds.
pub const BLOCK_DURATION_SECS: u64 = 120;

/// Longest accepted schedule interval.
pub const MAX_SCHEDULE_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// State file name, relative to the home directory.
pub const STATE_FILE_NAME: &str = ".fitblock_state.json";

/// Directory holding the config file and the daemon socket.
pub const APP_DIR_NAME: &str = ".fitblock";

/// Config file name inside [`APP_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Socket file name inside [`APP_DIR_NAME`].
pub const SOCKET_FILE_NAME: &str = "fitblock.sock";

// ============================================================================
// TriggerStrategy
// ============================================================================

/// How blocking sessions are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerStrategy {
    /// Run one session at launch, then exit
    #[default]
    Immediate,
    /// Run a session at launch and then once per schedule interval
    ScheduledHourly,
}

impl TriggerStrategy {
    /// Returns the string representation used in config files and flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerStrategy::Immediate => "immediate",
            TriggerStrategy::ScheduledHourly => "scheduled-hourly",
        }
    }
}

impl fmt::Display for TriggerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(TriggerStrategy::Immediate),
            "scheduled-hourly" | "hourly" => Ok(TriggerStrategy::ScheduledHourly),
            other => Err(format!(
                "unknown trigger '{}' (expected 'immediate' or 'scheduled-hourly')",
                other
            )),
        }
    }
}

// ============================================================================
// AppConfig
// ============================================================================

fn default_schedule_interval_minutes() -> u64 {
    60
}

fn default_progress_notification_seconds() -> u64 {
    30
}

fn default_notifications() -> bool {
    true
}

/// User configuration loaded from `~/.fitblock/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Session trigger strategy.
    #[serde(default)]
    pub trigger: TriggerStrategy,

    /// Minutes between sessions for the scheduled trigger.
    #[serde(default = "default_schedule_interval_minutes")]
    pub schedule_interval_minutes: u64,

    /// Minimum seconds between countdown progress notifications.
    #[serde(default = "default_progress_notification_seconds")]
    pub progress_notification_seconds: u64,

    /// Whether desktop notifications are sent at all.
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerStrategy::default(),
            schedule_interval_minutes: default_schedule_interval_minutes(),
            progress_notification_seconds: default_progress_notification_seconds(),
            notifications: default_notifications(),
        }
    }
}

impl AppConfig {
    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.schedule_interval_minutes == 0 {
            return Err("schedule_interval_minutes must be at least 1".to_string());
        }
        if self.schedule_interval_minutes > MAX_SCHEDULE_INTERVAL_MINUTES {
            return Err(format!(
                "schedule_interval_minutes must be at most {} (one week)",
                MAX_SCHEDULE_INTERVAL_MINUTES
            ));
        }
        if self.progress_notification_seconds == 0 {
            return Err("progress_notification_seconds must be at least 1".to_string());
        }
        Ok(())
    }

    /// Parses and validates a config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).context("Failed to parse config file")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Loads the config file, falling back to defaults.
    ///
    /// A missing file is silent; an unreadable or invalid one is logged.
    pub fn load_or_default(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Could not read config {:?}, using defaults: {}", path, e);
                return Self::default();
            }
        };

        match Self::from_json(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Invalid config {:?}, using defaults: {:#}", path, e);
                Self::default()
            }
        }
    }

    /// Schedule interval as a duration.
    pub fn schedule_interval(&self) -> std::time::Duration {
        let minutes = self
            .schedule_interval_minutes
            .clamp(1, MAX_SCHEDULE_INTERVAL_MINUTES);
        std::time::Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Progress notification interval as a duration.
    pub fn progress_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.progress_notification_seconds.max(1))
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Resolved file locations used by the daemon and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Persisted statistics
    pub state_file: PathBuf,
    /// Optional user configuration
    pub config_file: PathBuf,
    /// Daemon IPC socket
    pub socket: PathBuf,
}

impl AppPaths {
    /// Resolves the default locations under the home directory.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(Self::under(&home))
    }

    /// Builds the locations below an explicit home directory.
    pub fn under(home: &Path) -> Self {
        let app_dir = home.join(APP_DIR_NAME);
        Self {
            state_file: home.join(STATE_FILE_NAME),
            config_file: app_dir.join(CONFIG_FILE_NAME),
            socket: app_dir.join(SOCKET_FILE_NAME),
        }
    }

    /// Applies explicit overrides, keeping defaults for the rest.
    pub fn with_overrides(
        mut self,
        state_file: Option<PathBuf>,
        config_file: Option<PathBuf>,
        socket: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = state_file {
            self.state_file = path;
        }
        if let Some(path) = config_file {
            self.config_file = path;
        }
        if let Some(path) = socket {
            self.socket = path;
        }
        self
    }
}
