//! One-shot teardown guard.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Ensures a session is torn down exactly once.
///
/// The first caller of [`try_claim`](Self::try_claim) performs the teardown
/// and calls [`complete`](Self::complete); everyone else can
/// [`wait`](Self::wait) for that to happen.
#[derive(Debug)]
pub struct TeardownGuard {
    claimed: AtomicBool,
    done: watch::Sender<bool>,
}

impl Default for TeardownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TeardownGuard {
    #[must_use]
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            claimed: AtomicBool::new(false),
            done,
        }
    }

    /// Returns true for exactly one caller.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Marks the teardown as finished and wakes all waiters.
    pub fn complete(&self) {
        self.done.send_replace(true);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        *self.done.borrow()
    }

    /// Waits until [`complete`](Self::complete) has been called.
    pub async fn wait(&self) {
        let mut done = self.done.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting
        let _ = done.wait_for(|finished| *finished).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_single_claim() {
        let guard = TeardownGuard::new();
        assert!(!guard.is_claimed());
        assert!(guard.try_claim());
        assert!(!guard.try_claim());
        assert!(guard.is_claimed());
    }

    #[tokio::test]
    async fn test_wait_after_complete_returns() {
        let guard = TeardownGuard::new();
        guard.try_claim();
        guard.complete();

        assert!(guard.is_complete());
        tokio::time::timeout(Duration::from_secs(1), guard.wait())
            .await
            .expect("wait should return immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_released_by_completion() {
        let guard = Arc::new(TeardownGuard::new());
        assert!(guard.try_claim());

        let finisher = Arc::clone(&guard);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            finisher.complete();
        });

        let started = tokio::time::Instant::now();
        guard.wait().await;
        assert!(guard.is_complete());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
