//! Blocking-session lifecycle controller.
//!
//! A session moves `Idle → Starting → Active → Ending → Idle`. Setup runs in
//! a fixed order (shortcut guard, input interceptor, countdown) and teardown
//! releases the resources in reverse. Teardown happens exactly once per
//! session, whether the countdown finished or someone else (a signal handler,
//! an IPC `quit`) got there first. A teardown claimed during `Starting` waits
//! for setup to finish, so every acquired resource is released by it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::BLOCK_DURATION_SECS;
use crate::interceptor::{InputInterceptor, InterceptorHandle};
use crate::notification::{notify_quietly, Notifier};
use crate::presenter::{Countdown, CountdownPresenter, PresenterOutcome, SessionBanner, Surface};
use crate::shortcuts::ShortcutGuard;
use crate::store::StateStore;
use crate::types::{SessionPhase, SessionStats, StatusSnapshot};

use super::error::SessionError;
use super::teardown::TeardownGuard;

/// Title of the notification sent when a session starts.
pub const ACTIVE_TITLE: &str = "⚡ FitBlock Active";

/// Title of the notification sent when a session ends.
pub const COMPLETE_TITLE: &str = "🥇 Training Complete";

// ============================================================================
// Report
// ============================================================================

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The countdown ran to zero
    Completed,
    /// The session was stopped early
    Interrupted,
}

impl From<PresenterOutcome> for SessionOutcome {
    fn from(outcome: PresenterOutcome) -> Self {
        match outcome {
            PresenterOutcome::Completed => SessionOutcome::Completed,
            PresenterOutcome::Interrupted => SessionOutcome::Interrupted,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// True if input could not be intercepted (visual-only block)
    pub degraded: bool,
    pub session_number: u32,
}

// ============================================================================
// State
// ============================================================================

/// Resources of the running session.
#[derive(Debug)]
struct Session {
    started_at: DateTime<Local>,
    countdown: Option<Countdown>,
    tap_handle: Option<InterceptorHandle>,
    shortcuts_disabled: bool,
    teardown: Arc<TeardownGuard>,
    setup_done: watch::Sender<bool>,
}

/// Marks session setup as finished when dropped, even if the starting
/// future is cancelled part way.
struct SetupScope(watch::Sender<bool>);

impl SetupScope {
    fn finish(&self) {
        self.0.send_replace(true);
    }
}

impl Drop for SetupScope {
    fn drop(&mut self) {
        self.finish();
    }
}

#[derive(Debug)]
struct ControllerState {
    phase: SessionPhase,
    stats: SessionStats,
    session: Option<Session>,
}

// ============================================================================
// SessionController
// ============================================================================

/// Orchestrates the shortcut guard, the input interceptor and the countdown
/// presenter into blocking sessions, and owns the session statistics.
pub struct SessionController<G, I, N, S>
where
    G: ShortcutGuard,
    I: InputInterceptor,
    N: Notifier,
    S: Surface,
{
    guard: G,
    interceptor: I,
    notifier: N,
    presenter: tokio::sync::Mutex<CountdownPresenter<S>>,
    store: StateStore,
    state: Mutex<ControllerState>,
    stop: AtomicBool,
    duration: Duration,
}

impl<G, I, N, S> SessionController<G, I, N, S>
where
    G: ShortcutGuard,
    I: InputInterceptor,
    N: Notifier,
    S: Surface,
{
    /// Creates a controller, loading the statistics from `store`.
    pub fn new(
        guard: G,
        interceptor: I,
        notifier: N,
        presenter: CountdownPresenter<S>,
        store: StateStore,
    ) -> Self {
        let (stats, _) = store.load();
        Self::with_stats(guard, interceptor, notifier, presenter, store, stats)
    }

    /// Creates a controller with already loaded statistics.
    pub fn with_stats(
        guard: G,
        interceptor: I,
        notifier: N,
        presenter: CountdownPresenter<S>,
        store: StateStore,
        stats: SessionStats,
    ) -> Self {
        Self {
            guard,
            interceptor,
            notifier,
            presenter: tokio::sync::Mutex::new(presenter),
            store,
            state: Mutex::new(ControllerState {
                phase: SessionPhase::Idle,
                stats,
                session: None,
            }),
            stop: AtomicBool::new(false),
            duration: Duration::from_secs(BLOCK_DURATION_SECS),
        }
    }

    /// Overrides the session length.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn shortcut_guard(&self) -> &G {
        &self.guard
    }

    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, stats: &SessionStats) {
        if let Err(e) = self.store.save(stats) {
            warn!("Failed to save state, keeping it in memory: {}", e);
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    pub fn stats(&self) -> SessionStats {
        self.state().stats.clone()
    }

    /// Snapshot of phase, statistics and remaining time.
    pub fn status(&self) -> StatusSnapshot {
        let state = self.state();
        StatusSnapshot {
            phase: state.phase,
            stats: state.stats.clone(),
            remaining_seconds: state
                .session
                .as_ref()
                .and_then(|s| s.countdown)
                .map(|c| c.remaining()),
        }
    }

    /// Checks the start preconditions without starting anything.
    pub fn can_start(&self) -> Result<(), SessionError> {
        let state = self.state();
        if !state.phase.is_idle() {
            return Err(SessionError::AlreadyActive);
        }
        if state.stats.paused {
            return Err(SessionError::Paused);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Runs one blocking session to its end.
    ///
    /// Fails with [`SessionError::Paused`] without touching any system
    /// setting while sessions are paused.
    pub async fn start(&self) -> Result<SessionReport, SessionError> {
        // Held for the whole session so sessions never overlap on screen
        let mut presenter = self
            .presenter
            .try_lock()
            .map_err(|_| SessionError::AlreadyActive)?;

        let (teardown, setup, banner) = self.begin()?;
        let session_number = banner.session_number;

        notify_quietly(
            &self.notifier,
            ACTIVE_TITLE,
            &format!("Session #{} - {} seconds", session_number, self.duration.as_secs()),
        )
        .await;

        // Marked before the call so a partial or cancelled disable is restored too
        self.attach(&teardown, |session| session.shortcuts_disabled = true);
        if let Err(e) = self.guard.disable().await {
            warn!("Could not disable all system shortcuts: {}", e);
        }

        let degraded = match self.interceptor.install() {
            Ok(handle) => {
                let mut slot = Some(handle);
                if !self.attach(&teardown, |session| session.tap_handle = slot.take()) {
                    if let Some(mut handle) = slot {
                        self.interceptor.remove(&mut handle);
                    }
                }
                false
            }
            Err(e) => {
                warn!(
                    "Input interception unavailable, blocking visually only: {} ({})",
                    e,
                    e.suggestion()
                );
                true
            }
        };

        setup.finish();
        let countdown = Countdown::start(self.duration);
        let outcome = if self.activate(&teardown, countdown) {
            presenter
                .run(countdown, &banner, &self.stop, &self.notifier)
                .await
                .into()
        } else {
            SessionOutcome::Interrupted
        };

        if !self.teardown().await {
            teardown.wait().await;
        }

        info!("Session #{} ended: {:?}", session_number, outcome);
        Ok(SessionReport {
            outcome,
            degraded,
            session_number,
        })
    }

    /// `Idle → Starting`.
    fn begin(&self) -> Result<(Arc<TeardownGuard>, SetupScope, SessionBanner), SessionError> {
        let mut state = self.state();
        if !state.phase.is_idle() {
            return Err(SessionError::AlreadyActive);
        }
        if state.stats.paused {
            info!("Sessions are paused, not starting");
            return Err(SessionError::Paused);
        }

        let now = Local::now();
        let banner = SessionBanner {
            session_number: state.stats.next_session_number(),
            started_label: state.stats.since_first_start_label(now),
            total_hours: state.stats.hours_since_first_start(now),
        };

        state.stats.begin_session(now);
        self.persist(&state.stats);

        let teardown = Arc::new(TeardownGuard::new());
        let (setup_done, _) = watch::channel(false);
        state.session = Some(Session {
            started_at: now,
            countdown: None,
            tap_handle: None,
            shortcuts_disabled: false,
            teardown: Arc::clone(&teardown),
            setup_done: setup_done.clone(),
        });
        state.phase = SessionPhase::Starting;
        self.stop.store(false, Ordering::SeqCst);

        info!("Session #{} starting", banner.session_number);
        Ok((teardown, SetupScope(setup_done), banner))
    }

    /// Hands a freshly acquired resource to the session.
    ///
    /// Teardown keeps the session around until setup is finished, so this
    /// only returns false if the session is gone; the caller then still owns
    /// the resource and must release it.
    fn attach(&self, teardown: &Arc<TeardownGuard>, apply: impl FnOnce(&mut Session)) -> bool {
        let mut state = self.state();
        match state.session.as_mut() {
            Some(session) if Arc::ptr_eq(&session.teardown, teardown) && !teardown.is_complete() => {
                apply(session);
                true
            }
            _ => false,
        }
    }

    /// `Starting → Active`.
    ///
    /// Refused once teardown claimed the session or an interrupt arrived
    /// during setup.
    fn activate(&self, teardown: &Arc<TeardownGuard>, countdown: Countdown) -> bool {
        let mut state = self.state();
        let state = &mut *state;
        if self.stop.load(Ordering::SeqCst) {
            return false;
        }
        match state.session.as_mut() {
            Some(session) if Arc::ptr_eq(&session.teardown, teardown) && !teardown.is_claimed() => {
                session.countdown = Some(countdown);
                state.phase = SessionPhase::Active;
                info!("Session active for {}s", countdown.duration().as_secs());
                true
            }
            _ => false,
        }
    }

    /// Asks the running countdown to stop.
    ///
    /// Only stores an atomic flag, so it is safe to call from any context.
    /// The session then tears down through its normal path.
    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Releases the session's resources and records it.
    ///
    /// Runs at most once per session. A concurrent second caller waits for
    /// the first to finish. Returns true only for the caller that did the
    /// work; without a session this is a no-op returning false.
    ///
    /// When claimed during `Starting`, waits for setup to finish before
    /// releasing anything, and the session is not counted. The running-session
    /// marker stays persisted until the shortcuts have been restored.
    pub async fn teardown(&self) -> bool {
        let claimed = {
            let mut state = self.state();
            let state = &mut *state;
            let Some(session) = state.session.as_mut() else {
                return false;
            };

            let guard = Arc::clone(&session.teardown);
            if guard.try_claim() {
                let reached_active = state.phase == SessionPhase::Active;
                state.phase = SessionPhase::Ending;
                Ok((guard, session.setup_done.subscribe(), reached_active))
            } else {
                Err(guard)
            }
        };

        let (guard, mut setup_done, reached_active) = match claimed {
            Ok(claimed) => claimed,
            Err(guard) => {
                guard.wait().await;
                return false;
            }
        };

        if !reached_active {
            info!("Session stopped during setup, waiting for setup to finish");
        }
        // The sender lives in the session, which stays until this teardown completes
        let _ = setup_done.wait_for(|done| *done).await;

        let (tap, shortcuts_disabled, started_at) = {
            let mut state = self.state();
            match state.session.as_mut() {
                Some(session) => (
                    session.tap_handle.take(),
                    std::mem::take(&mut session.shortcuts_disabled),
                    session.started_at,
                ),
                None => (None, false, Local::now()),
            }
        };

        info!("Tearing down session started at {}", started_at.format("%H:%M:%S"));

        if let Some(mut handle) = tap {
            self.interceptor.remove(&mut handle);
        }
        if shortcuts_disabled {
            self.restore_shortcuts().await;
        }

        let completed = {
            let mut state = self.state();
            let completed = if reached_active {
                Some(state.stats.finish_session())
            } else {
                state.stats.abandon_session();
                None
            };
            state.session = None;
            state.phase = SessionPhase::Idle;
            self.persist(&state.stats);
            completed
        };

        guard.complete();

        match completed {
            Some(completed) => {
                info!("Session #{} recorded", completed);
                notify_quietly(
                    &self.notifier,
                    COMPLETE_TITLE,
                    &format!("Session #{} finished! 🎉", completed),
                )
                .await;
            }
            None => info!("Session ended before it became active, not counted"),
        }
        true
    }

    async fn restore_shortcuts(&self) {
        if let Err(e) = self.guard.enable().await {
            error!("Failed to re-enable system shortcuts: {} ({})", e, e.suggestion());
        }
    }

    // ------------------------------------------------------------------------
    // Idle-only operations
    // ------------------------------------------------------------------------

    fn idle_state(&self) -> Result<MutexGuard<'_, ControllerState>, SessionError> {
        let state = self.state();
        if state.phase.is_idle() {
            Ok(state)
        } else {
            Err(SessionError::NotIdle(state.phase))
        }
    }

    /// Gates future sessions. Returns false if already paused.
    pub fn pause(&self) -> Result<bool, SessionError> {
        let mut state = self.idle_state()?;
        let changed = state.stats.pause(Local::now());
        if changed {
            self.persist(&state.stats);
            info!("Sessions paused");
        }
        Ok(changed)
    }

    /// Lifts the gate. Returns false if not paused.
    pub fn resume(&self) -> Result<bool, SessionError> {
        let mut state = self.idle_state()?;
        let changed = state.stats.resume();
        if changed {
            self.persist(&state.stats);
            info!("Sessions resumed");
        }
        Ok(changed)
    }

    /// Reinitializes the statistics.
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut state = self.idle_state()?;
        state.stats.reset(Local::now());
        self.persist(&state.stats);
        info!("Statistics reset");
        Ok(())
    }

    /// Cleans up after a process that died mid-session.
    ///
    /// If the statistics still mark a running session, the system shortcuts
    /// are re-enabled and the marker is cleared without counting the session.
    /// Returns true if a stale session was found.
    pub async fn recover_interrupted_session(&self) -> bool {
        let stale = {
            let state = self.state();
            if !state.phase.is_idle() {
                return false;
            }
            state.stats.current_session_started_at
        };

        let Some(started_at) = stale else {
            return false;
        };

        warn!(
            "Previous session started at {} did not finish; restoring system shortcuts",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );
        self.restore_shortcuts().await;

        let mut state = self.state();
        state.stats.abandon_session();
        self.persist(&state.stats);
        true
    }
}
