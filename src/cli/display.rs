//! Display utilities for the FitBlock CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - System shortcut states

use chrono::{DateTime, Local};

use crate::presenter::format_mmss;
use crate::shortcuts::HotkeyState;
use crate::types::{IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the message of a successful command.
    pub fn show_success(response: &IpcResponse) {
        println!("✓ {}", response.message);
    }

    /// Shows the status of the blocker.
    pub fn show_status(data: &ResponseData, daemon_running: bool) {
        print!("{}", Self::format_status(data, daemon_running, Local::now()));
    }

    /// Shows which guarded system shortcuts are currently enabled.
    pub fn show_hotkeys(states: &[HotkeyState]) {
        print!("{}", Self::format_hotkeys(states));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Renders the status block.
    pub fn format_status(data: &ResponseData, daemon_running: bool, now: DateTime<Local>) -> String {
        let mut out = String::new();
        out.push_str("FitBlock Status\n");
        out.push_str("───────────────\n");

        out.push_str(&format!(
            "Blocker: {}\n",
            if daemon_running { "running" } else { "not running" }
        ));

        if daemon_running {
            let phase = data.phase.as_deref().unwrap_or("unknown");
            match data.remaining_seconds {
                Some(remaining) => out.push_str(&format!(
                    "Session: {} ({} remaining)\n",
                    phase,
                    format_mmss(remaining)
                )),
                None => out.push_str(&format!("Session: {}\n", phase)),
            }
        }

        let Some(stats) = data.to_stats() else {
            out.push_str("Statistics: unavailable\n");
            return out;
        };

        out.push_str(&format!("Sessions completed: {}\n", stats.sessions_completed));
        out.push_str(&format!(
            "Tracking since: {} ({})\n",
            stats.first_started_at.format("%Y-%m-%d %H:%M"),
            stats.since_first_start_label(now)
        ));
        out.push_str(&format!(
            "Total hours: {}\n",
            stats.hours_since_first_start(now)
        ));

        match stats.pause_started_at {
            Some(since) if stats.paused => out.push_str(&format!(
                "Paused: yes (since {})\n",
                since.format("%Y-%m-%d %H:%M")
            )),
            _ if stats.paused => out.push_str("Paused: yes\n"),
            _ => out.push_str("Paused: no\n"),
        }

        if !daemon_running {
            if let Some(started) = stats.current_session_started_at {
                out.push_str(&format!(
                    "Unfinished session from {} (recovered on next run)\n",
                    started.format("%Y-%m-%d %H:%M")
                ));
            }
        }

        out
    }

    /// Renders the shortcut list.
    pub fn format_hotkeys(states: &[HotkeyState]) -> String {
        let mut out = String::from("System shortcuts:\n");
        for state in states {
            let marker = match state.enabled {
                Some(true) => "enabled",
                Some(false) => "disabled",
                None => "default",
            };
            out.push_str(&format!("  {:<34} {}\n", state.name, marker));
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::types::timestamp;
    use crate::types::{SessionPhase, SessionStats, StatusSnapshot};

    fn at(raw: &str) -> DateTime<Local> {
        timestamp::parse(raw).unwrap()
    }

    fn data(phase: SessionPhase, stats: SessionStats, remaining: Option<u64>) -> ResponseData {
        ResponseData::from_snapshot(&StatusSnapshot {
            phase,
            stats,
            remaining_seconds: remaining,
        })
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_status_running_active() {
            let start = at("2024-05-01T08:00:00");
            let mut stats = SessionStats::fresh(start);
            stats.sessions_completed = 7;
            stats.begin_session(start + Duration::hours(26));

            let out = Display::format_status(
                &data(SessionPhase::Active, stats, Some(83)),
                true,
                start + Duration::hours(26),
            );

            assert!(out.contains("Blocker: running"));
            assert!(out.contains("Session: active (01:23 remaining)"));
            assert!(out.contains("Sessions completed: 7"));
            assert!(out.contains("(1d 2h ago)"));
            assert!(out.contains("Total hours: 26"));
            assert!(out.contains("Paused: no"));
            assert!(!out.contains("Unfinished"));
        }

        #[test]
        fn test_status_offline_paused() {
            let start = at("2024-05-01T08:00:00");
            let mut stats = SessionStats::fresh(start);
            stats.pause(at("2024-05-01T09:15:00"));

            let out = Display::format_status(
                &data(SessionPhase::Idle, stats, None),
                false,
                start + Duration::hours(2),
            );

            assert!(out.contains("Blocker: not running"));
            assert!(!out.contains("Session:"));
            assert!(out.contains("Paused: yes (since 2024-05-01 09:15)"));
        }

        #[test]
        fn test_status_offline_unfinished_session() {
            let start = at("2024-05-01T08:00:00");
            let mut stats = SessionStats::fresh(start);
            stats.begin_session(at("2024-05-01T10:00:00"));

            let out =
                Display::format_status(&data(SessionPhase::Idle, stats, None), false, start);

            assert!(out.contains("Unfinished session from 2024-05-01 10:00"));
        }

        #[test]
        fn test_status_without_stats() {
            let out = Display::format_status(&ResponseData::default(), true, Local::now());
            assert!(out.contains("Session: unknown"));
            assert!(out.contains("Statistics: unavailable"));
        }
    }

    mod hotkey_tests {
        use super::*;

        #[test]
        fn test_format_hotkeys() {
            let states = vec![
                HotkeyState {
                    id: 64,
                    name: "Spotlight search",
                    enabled: Some(false),
                },
                HotkeyState {
                    id: 32,
                    name: "Mission Control",
                    enabled: Some(true),
                },
                HotkeyState {
                    id: 98,
                    name: "Show Help menu",
                    enabled: None,
                },
            ];

            let out = Display::format_hotkeys(&states);
            let lines: Vec<&str> = out.lines().collect();

            assert_eq!(lines[0], "System shortcuts:");
            assert!(lines[1].starts_with("  Spotlight search"));
            assert!(lines[1].ends_with("disabled"));
            assert!(lines[2].ends_with("enabled"));
            assert!(lines[3].ends_with("default"));
        }
    }
}
