//! Countdown presenter.
//!
//! Owns the blocking surface and drives a once-per-second countdown on it.
//! The daemon draws on a shield window, falling back to the terminal.
//! The presenter only reports how the countdown ended; releasing the other
//! session resources is the controller's job.

pub mod countdown;
pub mod fallback;
pub mod surface;
pub mod terminal;
pub mod window;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::notification::{notify_quietly, Notifier};

pub use countdown::{format_mmss, Countdown, CountdownFrame, ProgressThrottle, SessionBanner};
pub use surface::{HeadlessSurface, Recording, RecordingSurface, Surface, SurfaceError};
pub use fallback::{platform_surface, FallbackSurface, PlatformSurface};
pub use terminal::TerminalSurface;
pub use window::WindowSurface;

/// Title of the periodic progress notification.
pub const PROGRESS_TITLE: &str = "🧠 Training Session";

/// Default spacing of progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterOutcome {
    /// The full duration elapsed
    Completed,
    /// The stop flag was raised first
    Interrupted,
}

/// Drives a countdown on a [`Surface`].
pub struct CountdownPresenter<S: Surface> {
    surface: S,
    tick: Duration,
    progress_interval: Duration,
}

impl<S: Surface> CountdownPresenter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            tick: Duration::from_secs(1),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Sets the minimum spacing of progress notifications.
    #[must_use]
    pub fn with_progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Runs the countdown until it elapses or `stop` is raised.
    ///
    /// If the surface cannot be shown the countdown still runs to its end
    /// without a display.
    pub async fn run<N: Notifier>(
        &mut self,
        countdown: Countdown,
        banner: &SessionBanner,
        stop: &AtomicBool,
        notifier: &N,
    ) -> PresenterOutcome {
        let mut visible = match self.surface.show() {
            Ok(()) => true,
            Err(e) => {
                warn!("Cannot show countdown, continuing headless: {}", e);
                false
            }
        };

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut throttle = ProgressThrottle::new(self.progress_interval);

        info!(
            "Countdown started: {}s for session #{}",
            countdown.duration().as_secs(),
            banner.session_number
        );

        let outcome = loop {
            ticker.tick().await;

            if stop.load(Ordering::SeqCst) {
                break PresenterOutcome::Interrupted;
            }

            let now = Instant::now();
            let remaining = countdown.remaining_at(now);

            if visible {
                let frame = CountdownFrame {
                    remaining_seconds: remaining,
                    banner: banner.clone(),
                };
                if let Err(e) = self.surface.render(&frame) {
                    warn!("Countdown render failed, continuing headless: {}", e);
                    visible = false;
                }
            }

            if remaining == 0 {
                break PresenterOutcome::Completed;
            }

            if throttle.should_emit(now) {
                let message = format!("Time remaining: {}", format_mmss(remaining));
                notify_quietly(notifier, PROGRESS_TITLE, &message).await;
            }
        };

        if let Err(e) = self.surface.hide() {
            warn!("Failed to release countdown surface: {}", e);
        }

        debug!("Countdown finished: {:?}", outcome);
        outcome
    }
}
