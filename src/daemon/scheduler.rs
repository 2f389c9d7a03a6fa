//! Session trigger scheduling.
//!
//! Decides when the daemon starts blocking sessions:
//! - `immediate`: one session at launch
//! - `scheduled-hourly`: one at launch, then one per interval, plus any
//!   requested over IPC

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::TriggerStrategy;
use crate::interceptor::InputInterceptor;
use crate::notification::Notifier;
use crate::presenter::Surface;
use crate::session::{SessionController, SessionError};
use crate::shortcuts::ShortcutGuard;

/// Runs sessions according to a [`TriggerStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    strategy: TriggerStrategy,
    period: Duration,
}

impl Scheduler {
    /// Creates a scheduler. `period` only matters for the scheduled strategy.
    pub fn new(strategy: TriggerStrategy, period: Duration) -> Self {
        Self { strategy, period }
    }

    pub fn strategy(&self) -> TriggerStrategy {
        self.strategy
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs until the strategy is exhausted or `shutdown` flips to true.
    ///
    /// Returns the number of sessions that actually ran. A session in
    /// progress is never cut short here; stopping it is the job of
    /// [`SessionController::interrupt`].
    pub async fn run<G, I, N, S>(
        &self,
        controller: &SessionController<G, I, N, S>,
        mut triggers: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) -> u32
    where
        G: ShortcutGuard,
        I: InputInterceptor,
        N: Notifier,
        S: Surface,
    {
        let mut sessions = 0;

        match self.strategy {
            TriggerStrategy::Immediate => {
                if !*shutdown.borrow() && run_session(controller).await {
                    sessions += 1;
                }
            }
            TriggerStrategy::ScheduledHourly => {
                tracing::info!(
                    "Scheduling a session every {} minutes",
                    self.period.as_secs() / 60
                );

                // The first tick completes immediately, giving the launch session
                let mut ticker = interval(self.period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    let triggered = tokio::select! {
                        biased;
                        _ = shutdown.changed() => false,
                        _ = ticker.tick() => true,
                        Some(()) = triggers.recv() => {
                            tracing::info!("Session requested over IPC");
                            true
                        }
                    };

                    if !triggered || *shutdown.borrow() {
                        break;
                    }
                    if run_session(controller).await {
                        sessions += 1;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduler finished after {} session(s)", sessions);
        sessions
    }
}

/// Starts one session, logging why it was skipped if it was.
async fn run_session<G, I, N, S>(controller: &SessionController<G, I, N, S>) -> bool
where
    G: ShortcutGuard,
    I: InputInterceptor,
    N: Notifier,
    S: Surface,
{
    match controller.start().await {
        Ok(report) => {
            if report.degraded {
                tracing::warn!(
                    "Session #{} blocked the screen only; input was not intercepted",
                    report.session_number
                );
            }
            true
        }
        Err(SessionError::Paused) => {
            tracing::info!("Sessions are paused, skipping this trigger");
            false
        }
        Err(e) => {
            tracing::info!("Skipping trigger: {}", e);
            false
        }
    }
}
