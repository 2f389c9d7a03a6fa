//! Desktop notifications.
//!
//! Notifications are delivered by spawning `terminal-notifier` when it is
//! installed, otherwise `osascript`. Delivery runs on the blocking pool with
//! a timeout so a hung backend never stalls the countdown.
//!
//! # Example
//!
//! ```no_run
//! use fitblock::notification::{notify_quietly, SystemNotifier};
//!
//! # async fn example() {
//! let notifier = SystemNotifier::detect();
//! notify_quietly(&notifier, "⚡ FitBlock Active", "Session #1 - 120 seconds").await;
//! # }
//! ```

pub mod backend;
pub mod error;

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

pub use backend::Backend;
pub use error::NotificationError;

/// Default timeout for one notification in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// Delivers transient user-facing messages.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError>;
    fn is_available(&self) -> bool;
}

/// Sends a notification and logs any failure at debug level.
pub async fn notify_quietly<N: Notifier>(notifier: &N, title: &str, message: &str) {
    if let Err(e) = notifier.notify(title, message).await {
        debug!("Notification '{}' not delivered: {}", title, e);
    }
}

// ============================================================================
// SystemNotifier
// ============================================================================

/// Notifier backed by a command-line notification tool.
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    backend: Option<Backend>,
    enabled: bool,
    icon: Option<PathBuf>,
    timeout_seconds: u64,
}

impl SystemNotifier {
    /// Uses the best backend found on this system.
    #[must_use]
    pub fn detect() -> Self {
        Self::with_backend(Backend::detect())
    }

    /// Uses an explicit backend (`None` disables delivery).
    #[must_use]
    pub fn with_backend(backend: Option<Backend>) -> Self {
        Self {
            backend,
            enabled: true,
            icon: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Switches delivery on or off.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the icon shown by backends that support one.
    #[must_use]
    pub fn with_icon(mut self, icon: Option<PathBuf>) -> Self {
        self.icon = icon;
        self
    }

    #[must_use]
    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }
}

impl Notifier for SystemNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        if !self.enabled {
            return Err(NotificationError::Disabled);
        }
        let backend = self.backend.ok_or(NotificationError::NotAvailable)?;

        let name = backend.name();
        let args = backend.args(title, message, self.icon.as_deref());
        let task = tokio::task::spawn_blocking(move || Command::new(name).args(&args).output());

        let output = match timeout(Duration::from_secs(self.timeout_seconds), task).await {
            Ok(joined) => joined
                .map_err(|e| NotificationError::SendFailed(name.to_string(), e.to_string()))?
                .map_err(|e| NotificationError::SendFailed(name.to_string(), e.to_string()))?,
            Err(_) => {
                return Err(NotificationError::Timeout(
                    name.to_string(),
                    self.timeout_seconds,
                ))
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(NotificationError::SendFailed(
                name.to_string(),
                output.status.to_string(),
            ))
        }
    }

    fn is_available(&self) -> bool {
        self.enabled && self.backend.is_some()
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Mock notifier for testing; records every delivered message.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<(String, String)>>,
    should_fail: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// All `(title, message)` pairs delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Titles delivered so far, in order.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

impl Notifier for MockNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed(
                "mock".to_string(),
                "simulated failure".to_string(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier() {
        let notifier = SystemNotifier::with_backend(Some(Backend::Osascript)).enabled(false);
        assert!(!notifier.is_available());
        assert_eq!(
            notifier.notify("t", "m").await,
            Err(NotificationError::Disabled)
        );
    }

    #[tokio::test]
    async fn test_no_backend() {
        let notifier = SystemNotifier::with_backend(None);
        assert!(!notifier.is_available());
        assert_eq!(
            notifier.notify("t", "m").await,
            Err(NotificationError::NotAvailable)
        );
    }

    #[tokio::test]
    async fn test_mock_records_messages() {
        let notifier = MockNotifier::new();
        notifier.notify("🥇 Training Complete", "Session #1 finished! 🎉").await.unwrap();

        assert_eq!(
            notifier.sent(),
            vec![(
                "🥇 Training Complete".to_string(),
                "Session #1 finished! 🎉".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_notify_quietly_swallows_errors() {
        let notifier = MockNotifier::new();
        notifier.set_should_fail(true);

        notify_quietly(&notifier, "t", "m").await;
        assert!(notifier.sent().is_empty());
    }
}
