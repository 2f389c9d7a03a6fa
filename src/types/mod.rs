//! Core data types for FitBlock.
//!
//! This module defines the data structures used for:
//! - Persisted session statistics
//! - Session lifecycle phases and status snapshots
//! - IPC request/response serialization

pub mod timestamp;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================================
// SessionPhase
// ============================================================================

/// Lifecycle phase of the blocking session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session is running
    #[default]
    Idle,
    /// Acquiring the shortcut guard and input interceptor
    Starting,
    /// Countdown is running
    Active,
    /// Releasing resources and recording the session
    Ending,
}

impl SessionPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Starting => "starting",
            SessionPhase::Active => "active",
            SessionPhase::Ending => "ending",
        }
    }

    /// Returns true if no session is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionPhase::Idle)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SessionStats
// ============================================================================

/// Accumulated statistics, persisted between runs.
///
/// The serialized field names match the state files written by earlier
/// versions of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// When the tool was first started (or last reset)
    #[serde(rename = "start_time", with = "timestamp")]
    pub first_started_at: DateTime<Local>,
    /// Number of sessions that ran to teardown
    #[serde(default)]
    pub sessions_completed: u32,
    /// Start of the running session; set iff a session is running
    #[serde(rename = "current_session_start", default, with = "timestamp::option")]
    pub current_session_started_at: Option<DateTime<Local>>,
    /// Whether future sessions are gated
    #[serde(default)]
    pub paused: bool,
    /// When the pause began; set iff `paused`
    #[serde(rename = "pause_start_time", default, with = "timestamp::option")]
    pub pause_started_at: Option<DateTime<Local>>,
}

impl SessionStats {
    /// Creates first-run statistics.
    pub fn fresh(now: DateTime<Local>) -> Self {
        Self {
            first_started_at: now,
            sessions_completed: 0,
            current_session_started_at: None,
            paused: false,
            pause_started_at: None,
        }
    }

    /// Returns true if the stats record a running session.
    pub fn is_session_running(&self) -> bool {
        self.current_session_started_at.is_some()
    }

    /// Number that the next (or currently running) session will carry.
    pub fn next_session_number(&self) -> u32 {
        self.sessions_completed.saturating_add(1)
    }

    /// Marks a session as started.
    pub fn begin_session(&mut self, now: DateTime<Local>) {
        self.current_session_started_at = Some(now);
    }

    /// Marks the running session as finished and returns the new total.
    pub fn finish_session(&mut self) -> u32 {
        self.sessions_completed = self.sessions_completed.saturating_add(1);
        self.current_session_started_at = None;
        self.sessions_completed
    }

    /// Clears a stale running-session marker without counting it.
    pub fn abandon_session(&mut self) -> Option<DateTime<Local>> {
        self.current_session_started_at.take()
    }

    /// Gates future sessions. Returns false if already paused.
    pub fn pause(&mut self, now: DateTime<Local>) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        self.pause_started_at = Some(now);
        true
    }

    /// Lifts the gate. Returns false if not paused.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.pause_started_at = None;
        true
    }

    /// Reinitializes all statistics.
    pub fn reset(&mut self, now: DateTime<Local>) {
        *self = Self::fresh(now);
    }

    /// Whole hours elapsed since the first start.
    pub fn hours_since_first_start(&self, now: DateTime<Local>) -> i64 {
        (now - self.first_started_at).num_hours().max(0)
    }

    /// Human-readable age of the statistics, e.g. "2d 3h ago".
    pub fn since_first_start_label(&self, now: DateTime<Local>) -> String {
        let elapsed = (now - self.first_started_at).num_seconds().max(0);
        let days = elapsed / 86_400;
        let hours = (elapsed % 86_400) / 3_600;
        let minutes = (elapsed % 3_600) / 60;

        if days > 0 {
            format!("{}d {}h ago", days, hours)
        } else if hours > 0 {
            format!("{}h ago", hours)
        } else {
            format!("{}m ago", minutes)
        }
    }
}

// ============================================================================
// StatusSnapshot
// ============================================================================

/// Point-in-time view of the controller, used by status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current lifecycle phase
    pub phase: SessionPhase,
    /// Copy of the statistics
    pub stats: SessionStats,
    /// Seconds left in the active session, if any
    pub remaining_seconds: Option<u64>,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a blocking session now
    Start,
    /// Gate future sessions
    Pause,
    /// Lift the gate
    Resume,
    /// Reinitialize statistics
    Reset,
    /// Query the current status
    Status,
    /// Interrupt any session and shut the daemon down
    Quit,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current lifecycle phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Seconds left in the active session
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    /// Completed session count
    #[serde(rename = "sessionsCompleted", skip_serializing_if = "Option::is_none")]
    pub sessions_completed: Option<u32>,
    /// Whether future sessions are gated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// First start timestamp (ISO-8601)
    #[serde(rename = "firstStartedAt", skip_serializing_if = "Option::is_none")]
    pub first_started_at: Option<String>,
    /// Running session start timestamp (ISO-8601)
    #[serde(rename = "sessionStartedAt", skip_serializing_if = "Option::is_none")]
    pub session_started_at: Option<String>,
    /// Pause start timestamp (ISO-8601)
    #[serde(rename = "pauseStartedAt", skip_serializing_if = "Option::is_none")]
    pub pause_started_at: Option<String>,
}

impl ResponseData {
    /// Creates response data from a status snapshot.
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        let stats = &snapshot.stats;
        Self {
            phase: Some(snapshot.phase.as_str().to_string()),
            remaining_seconds: snapshot.remaining_seconds,
            sessions_completed: Some(stats.sessions_completed),
            paused: Some(stats.paused),
            first_started_at: Some(timestamp::format(&stats.first_started_at)),
            session_started_at: stats.current_session_started_at.as_ref().map(timestamp::format),
            pause_started_at: stats.pause_started_at.as_ref().map(timestamp::format),
        }
    }

    /// Rebuilds the statistics carried by this response, if complete.
    pub fn to_stats(&self) -> Option<SessionStats> {
        let first_started_at = timestamp::parse(self.first_started_at.as_deref()?).ok()?;
        let parse_opt = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|raw| timestamp::parse(raw).ok())
        };
        Some(SessionStats {
            first_started_at,
            sessions_completed: self.sessions_completed.unwrap_or(0),
            current_session_started_at: parse_opt(&self.session_started_at),
            paused: self.paused.unwrap_or(false),
            pause_started_at: parse_opt(&self.pause_started_at),
        })
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for success responses.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(raw: &str) -> DateTime<Local> {
        timestamp::parse(raw).unwrap()
    }

    // ------------------------------------------------------------------------
    // SessionPhase Tests
    // ------------------------------------------------------------------------

    mod session_phase_tests {
        use super::*;

        #[test]
        fn test_default_is_idle() {
            assert_eq!(SessionPhase::default(), SessionPhase::Idle);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(SessionPhase::Idle.as_str(), "idle");
            assert_eq!(SessionPhase::Starting.as_str(), "starting");
            assert_eq!(SessionPhase::Active.as_str(), "active");
            assert_eq!(SessionPhase::Ending.as_str(), "ending");
        }

        #[test]
        fn test_is_idle() {
            assert!(SessionPhase::Idle.is_idle());
            assert!(!SessionPhase::Starting.is_idle());
            assert!(!SessionPhase::Active.is_idle());
            assert!(!SessionPhase::Ending.is_idle());
        }

        #[test]
        fn test_serialize() {
            let json = serde_json::to_string(&SessionPhase::Active).unwrap();
            assert_eq!(json, "\"active\"");
        }
    }

    // ------------------------------------------------------------------------
    // SessionStats Tests
    // ------------------------------------------------------------------------

    mod session_stats_tests {
        use super::*;

        #[test]
        fn test_fresh() {
            let now = Local::now();
            let stats = SessionStats::fresh(now);
            assert_eq!(stats.first_started_at, now);
            assert_eq!(stats.sessions_completed, 0);
            assert!(!stats.paused);
            assert!(stats.pause_started_at.is_none());
            assert!(!stats.is_session_running());
        }

        #[test]
        fn test_begin_and_finish_session() {
            let now = Local::now();
            let mut stats = SessionStats::fresh(now);

            stats.begin_session(now);
            assert!(stats.is_session_running());
            assert_eq!(stats.next_session_number(), 1);

            assert_eq!(stats.finish_session(), 1);
            assert!(!stats.is_session_running());
            assert_eq!(stats.next_session_number(), 2);
        }

        #[test]
        fn test_abandon_session_does_not_count() {
            let now = Local::now();
            let mut stats = SessionStats::fresh(now);
            stats.begin_session(now);

            assert_eq!(stats.abandon_session(), Some(now));
            assert_eq!(stats.sessions_completed, 0);
            assert!(stats.abandon_session().is_none());
        }

        #[test]
        fn test_pause_and_resume_keep_invariant() {
            let now = Local::now();
            let mut stats = SessionStats::fresh(now);

            assert!(stats.pause(now));
            assert!(stats.paused);
            assert_eq!(stats.pause_started_at, Some(now));

            // A second pause keeps the original pause time
            assert!(!stats.pause(now + Duration::minutes(5)));
            assert_eq!(stats.pause_started_at, Some(now));

            assert!(stats.resume());
            assert!(!stats.paused);
            assert!(stats.pause_started_at.is_none());
            assert!(!stats.resume());
        }

        #[test]
        fn test_reset() {
            let now = Local::now();
            let mut stats = SessionStats::fresh(now - Duration::days(3));
            stats.sessions_completed = 12;
            stats.pause(now);

            stats.reset(now);
            assert_eq!(stats, SessionStats::fresh(now));
        }

        #[test]
        fn test_hours_since_first_start() {
            let start = at("2024-05-01T08:00:00");
            let stats = SessionStats::fresh(start);

            assert_eq!(stats.hours_since_first_start(start), 0);
            assert_eq!(stats.hours_since_first_start(start + Duration::minutes(59)), 0);
            assert_eq!(stats.hours_since_first_start(start + Duration::minutes(61)), 1);
            assert_eq!(stats.hours_since_first_start(start + Duration::days(2)), 48);
        }

        #[test]
        fn test_since_first_start_label() {
            let start = at("2024-05-01T08:00:00");
            let stats = SessionStats::fresh(start);

            assert_eq!(stats.since_first_start_label(start + Duration::minutes(7)), "7m ago");
            assert_eq!(stats.since_first_start_label(start + Duration::hours(5)), "5h ago");
            assert_eq!(
                stats.since_first_start_label(start + Duration::days(2) + Duration::hours(3)),
                "2d 3h ago"
            );
        }

        #[test]
        fn test_since_first_start_label_clock_skew() {
            let start = at("2024-05-01T08:00:00");
            let stats = SessionStats::fresh(start);
            assert_eq!(stats.since_first_start_label(start - Duration::hours(1)), "0m ago");
        }

        #[test]
        fn test_serialized_keys() {
            let stats = SessionStats::fresh(at("2024-05-01T08:00:00"));
            let json = serde_json::to_value(&stats).unwrap();

            assert!(json.get("start_time").unwrap().is_string());
            assert_eq!(json["sessions_completed"], 0);
            assert!(json["current_session_start"].is_null());
            assert_eq!(json["paused"], false);
            assert!(json["pause_start_time"].is_null());
        }

        #[test]
        fn test_deserialize_legacy_file() {
            let json = r#"{
                "start_time": "2024-05-01T08:00:00.123456",
                "sessions_completed": 4,
                "current_session_start": null,
                "paused": true,
                "pause_start_time": "2024-05-02T09:30:00"
            }"#;

            let stats: SessionStats = serde_json::from_str(json).unwrap();
            assert_eq!(stats.sessions_completed, 4);
            assert!(stats.paused);
            assert_eq!(stats.pause_started_at, Some(at("2024-05-02T09:30:00")));
        }

        #[test]
        fn test_deserialize_missing_optional_fields() {
            let json = r#"{"start_time": "2024-05-01T08:00:00+02:00"}"#;
            let stats: SessionStats = serde_json::from_str(json).unwrap();

            assert_eq!(stats.sessions_completed, 0);
            assert!(!stats.paused);
            assert!(stats.current_session_started_at.is_none());
        }
    }

    // ------------------------------------------------------------------------
    // IPC Type Tests
    // ------------------------------------------------------------------------

    mod ipc_tests {
        use super::*;

        #[test]
        fn test_request_serialization() {
            let json = serde_json::to_string(&IpcRequest::Pause).unwrap();
            assert_eq!(json, r#"{"command":"pause"}"#);

            let request: IpcRequest = serde_json::from_str(r#"{"command":"reset"}"#).unwrap();
            assert_eq!(request, IpcRequest::Reset);
        }

        #[test]
        fn test_request_unknown_command() {
            let result: Result<IpcRequest, _> = serde_json::from_str(r#"{"command":"explode"}"#);
            assert!(result.is_err());
        }

        #[test]
        fn test_response_helpers() {
            let ok = IpcResponse::success("done", None);
            assert!(ok.is_success());
            assert_eq!(ok.message, "done");

            let err = IpcResponse::error("nope");
            assert!(!err.is_success());
            assert_eq!(err.status, "error");
        }

        #[test]
        fn test_response_data_from_snapshot() {
            let start = at("2024-05-01T08:00:00");
            let mut stats = SessionStats::fresh(start);
            stats.sessions_completed = 3;
            stats.begin_session(start + Duration::hours(1));

            let snapshot = StatusSnapshot {
                phase: SessionPhase::Active,
                stats: stats.clone(),
                remaining_seconds: Some(42),
            };
            let data = ResponseData::from_snapshot(&snapshot);

            assert_eq!(data.phase.as_deref(), Some("active"));
            assert_eq!(data.remaining_seconds, Some(42));
            assert_eq!(data.sessions_completed, Some(3));
            assert_eq!(data.paused, Some(false));
            assert!(data.session_started_at.is_some());
            assert!(data.pause_started_at.is_none());
            assert_eq!(data.to_stats(), Some(stats));
        }

        #[test]
        fn test_response_data_skips_none_fields() {
            let json = serde_json::to_string(&ResponseData::default()).unwrap();
            assert_eq!(json, "{}");
        }
    }
}
