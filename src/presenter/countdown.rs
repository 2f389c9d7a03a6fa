//! Countdown arithmetic and frame contents.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Formats seconds as `MM:SS`.
#[must_use]
pub fn format_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

// ============================================================================
// Countdown
// ============================================================================

/// Fixed-length countdown.
///
/// Remaining time is derived from elapsed time on every query, so late or
/// skipped ticks never shift the end. Elapsed time is the larger of the
/// monotonic and the wall-clock reading: the monotonic clock stops while the
/// machine sleeps, the wall clock does not, and a wall clock stepped back
/// never extends the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: Instant,
    started_wall: DateTime<Local>,
    duration: Duration,
}

impl Countdown {
    /// Starts a countdown now.
    #[must_use]
    pub fn start(duration: Duration) -> Self {
        Self::starting_at(Instant::now(), duration)
    }

    #[must_use]
    pub fn starting_at(started_at: Instant, duration: Duration) -> Self {
        Self {
            started_at,
            started_wall: Local::now(),
            duration,
        }
    }

    /// Overrides the wall-clock start time.
    #[must_use]
    pub fn with_wall_start(mut self, started_wall: DateTime<Local>) -> Self {
        self.started_wall = started_wall;
        self
    }

    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds left at `now`, clamped at zero.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> u64 {
        self.remaining_with(now, Local::now())
    }

    /// Whole seconds left at the given monotonic and wall-clock readings.
    #[must_use]
    pub fn remaining_with(&self, now: Instant, wall_now: DateTime<Local>) -> u64 {
        let monotonic = now.saturating_duration_since(self.started_at);
        let wall = (wall_now - self.started_wall).to_std().unwrap_or_default();
        let elapsed = monotonic.max(wall).as_secs();
        self.duration.as_secs().saturating_sub(elapsed)
    }

    /// Whole seconds left right now.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining_at(Instant::now())
    }
}

// ============================================================================
// ProgressThrottle
// ============================================================================

/// Rate limit for progress notifications.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true (and records `now`) if a notification is due.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        let due = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Session details shown under the countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBanner {
    /// Number of the running session
    pub session_number: u32,
    /// Age of the statistics, e.g. "2d 3h ago"
    pub started_label: String,
    /// Whole hours since the first start
    pub total_hours: i64,
}

/// Everything a surface needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownFrame {
    pub remaining_seconds: u64,
    pub banner: SessionBanner,
}

impl CountdownFrame {
    pub const HEADLINE: &'static str = "Training Session";

    #[must_use]
    pub fn time_line(&self) -> String {
        format!("Time remaining: {}", format_mmss(self.remaining_seconds))
    }

    #[must_use]
    pub fn info_line(&self) -> String {
        format!(
            "Session #{} • Started {} • {} total hours",
            self.banner.session_number, self.banner.started_label, self.banner.total_hours
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(59), "00:59");
        assert_eq!(format_mmss(120), "02:00");
        assert_eq!(format_mmss(3_725), "62:05");
    }

    mod countdown_tests {
        use super::*;

        #[test]
        fn test_remaining_follows_elapsed_time() {
            let start = Instant::now();
            let countdown = Countdown::starting_at(start, Duration::from_secs(120));

            assert_eq!(countdown.remaining_at(start), 120);
            assert_eq!(countdown.remaining_at(start + Duration::from_millis(999)), 120);
            assert_eq!(countdown.remaining_at(start + Duration::from_secs(1)), 119);
            assert_eq!(countdown.remaining_at(start + Duration::from_secs(61)), 59);
        }

        #[test]
        fn test_remaining_clamps_at_zero() {
            let start = Instant::now();
            let countdown = Countdown::starting_at(start, Duration::from_secs(120));

            assert_eq!(countdown.remaining_at(start + Duration::from_secs(120)), 0);
            assert_eq!(countdown.remaining_at(start + Duration::from_secs(125)), 0);
        }

        #[test]
        fn test_remaining_before_start() {
            let start = Instant::now() + Duration::from_secs(10);
            let countdown = Countdown::starting_at(start, Duration::from_secs(120));
            assert_eq!(countdown.remaining_at(Instant::now()), 120);
        }

        #[test]
        fn test_wall_clock_covers_system_sleep() {
            let start = Instant::now();
            let wall = Local::now();
            let countdown =
                Countdown::starting_at(start, Duration::from_secs(120)).with_wall_start(wall);

            // Monotonic time stood still for 90s of machine sleep
            let after_sleep = wall + chrono::Duration::seconds(90);
            assert_eq!(countdown.remaining_with(start, after_sleep), 30);

            let after_long_sleep = wall + chrono::Duration::minutes(10);
            assert_eq!(countdown.remaining_with(start, after_long_sleep), 0);
        }

        #[test]
        fn test_wall_clock_stepped_back_does_not_extend() {
            let start = Instant::now();
            let wall = Local::now();
            let countdown =
                Countdown::starting_at(start, Duration::from_secs(120)).with_wall_start(wall);

            let stepped_back = wall - chrono::Duration::minutes(5);
            assert_eq!(
                countdown.remaining_with(start + Duration::from_secs(20), stepped_back),
                100
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_remaining_ignores_tick_jitter() {
            let countdown = Countdown::start(Duration::from_secs(120));

            // Irregular sleeps land on the same remaining value as the clock says
            tokio::time::sleep(Duration::from_millis(1_700)).await;
            assert_eq!(countdown.remaining(), 119);
            tokio::time::sleep(Duration::from_millis(3_450)).await;
            assert_eq!(countdown.remaining(), 115);
        }
    }

    mod throttle_tests {
        use super::*;

        #[test]
        fn test_first_call_emits() {
            let mut throttle = ProgressThrottle::new(Duration::from_secs(30));
            assert!(throttle.should_emit(Instant::now()));
        }

        #[test]
        fn test_rate_limited() {
            let start = Instant::now();
            let mut throttle = ProgressThrottle::new(Duration::from_secs(30));

            assert!(throttle.should_emit(start));
            assert!(!throttle.should_emit(start + Duration::from_secs(1)));
            assert!(!throttle.should_emit(start + Duration::from_secs(29)));
            assert!(throttle.should_emit(start + Duration::from_secs(30)));
            assert!(!throttle.should_emit(start + Duration::from_secs(59)));
            assert!(throttle.should_emit(start + Duration::from_secs(60)));
        }
    }

    #[test]
    fn test_frame_lines() {
        let frame = CountdownFrame {
            remaining_seconds: 95,
            banner: SessionBanner {
                session_number: 4,
                started_label: "2d 3h ago".to_string(),
                total_hours: 51,
            },
        };

        assert_eq!(CountdownFrame::HEADLINE, "Training Session");
        assert_eq!(frame.time_line(), "Time remaining: 01:35");
        assert_eq!(frame.info_line(), "Session #4 • Started 2d 3h ago • 51 total hours");
    }
}
