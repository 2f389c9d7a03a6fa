//! System shortcut guard.
//!
//! While a session runs, the global shortcuts that would let the user escape
//! the block (Spotlight, Mission Control, application windows, menu bar and
//! Dock focus) are switched off, and switched back on when it ends.
//!
//! # Error Handling
//!
//! Toggling is collect-and-continue: a failing hotkey does not stop the
//! others, and the failures are reported together as
//! [`ShortcutGuardError::Partial`]. All errors are recoverable.

pub mod error;
pub mod hotkeys;
pub mod prefs;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};

pub use error::ShortcutGuardError;
pub use hotkeys::{HotkeyCommands, GUARDED_HOTKEYS};
pub use prefs::{preferences_path, read_hotkey_states, HotkeyState};

/// Enables and disables the guarded system shortcuts.
#[allow(async_fn_in_trait)]
pub trait ShortcutGuard {
    /// Switches the guarded shortcuts off.
    async fn disable(&self) -> Result<(), ShortcutGuardError>;
    /// Switches the guarded shortcuts back on. Safe to call repeatedly.
    async fn enable(&self) -> Result<(), ShortcutGuardError>;
    fn is_available(&self) -> bool;
}

/// Guard backed by the `com.apple.symbolichotkeys` preferences.
#[derive(Debug, Clone, Default)]
pub struct SymbolicHotkeyGuard {
    commands: HotkeyCommands,
}

impl SymbolicHotkeyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom command paths.
    #[must_use]
    pub fn with_commands(commands: HotkeyCommands) -> Self {
        Self { commands }
    }

    /// Writes the preferences as the given user.
    #[must_use]
    pub fn run_as(mut self, uid: Option<u32>) -> Self {
        self.commands.run_as_uid = uid;
        self
    }

    #[must_use]
    pub fn commands(&self) -> &HotkeyCommands {
        &self.commands
    }

    async fn apply(&self, enabled: bool) -> Result<(), ShortcutGuardError> {
        let mut failures = Vec::new();

        for &(id, name) in GUARDED_HOTKEYS.iter() {
            match self.commands.write_hotkey(id, enabled).await {
                Ok(()) => {}
                Err(e @ ShortcutGuardError::PlatformUnavailable(_)) => return Err(e),
                Err(e) => {
                    warn!("Failed to update hotkey {} ({}): {}", id, name, e);
                    failures.push(format!("hotkey {}: {}", id, e));
                }
            }
        }

        if let Err(e) = self.commands.refresh_ui().await {
            warn!("Failed to refresh SystemUIServer: {}", e);
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShortcutGuardError::Partial(failures))
        }
    }
}

impl ShortcutGuard for SymbolicHotkeyGuard {
    async fn disable(&self) -> Result<(), ShortcutGuardError> {
        info!("Disabling system shortcuts");
        self.apply(false).await
    }

    async fn enable(&self) -> Result<(), ShortcutGuardError> {
        info!("Re-enabling system shortcuts");
        self.apply(true).await
    }

    fn is_available(&self) -> bool {
        self.commands.defaults.exists()
    }
}

/// Mock guard for testing.
#[derive(Debug)]
pub struct MockShortcutGuard {
    enable_calls: AtomicUsize,
    disable_calls: AtomicUsize,
    available: AtomicBool,
    should_fail_enable: AtomicBool,
    should_fail_disable: AtomicBool,
    disable_delay: Mutex<Duration>,
}

impl Default for MockShortcutGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShortcutGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            should_fail_enable: AtomicBool::new(false),
            should_fail_disable: AtomicBool::new(false),
            disable_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail_enable(&self, should_fail: bool) {
        self.should_fail_enable.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_disable(&self, should_fail: bool) {
        self.should_fail_disable.store(should_fail, Ordering::SeqCst);
    }

    /// Makes every `disable()` take `delay` before returning.
    pub fn set_disable_delay(&self, delay: Duration) {
        *self.disable_delay.lock().unwrap() = delay;
    }

    /// Number of `enable()` calls, failed ones included.
    #[must_use]
    pub fn enable_call_count(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    /// Number of `disable()` calls, failed ones included.
    #[must_use]
    pub fn disable_call_count(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }
}

impl ShortcutGuard for MockShortcutGuard {
    async fn disable(&self) -> Result<(), ShortcutGuardError> {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.disable_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail_disable.load(Ordering::SeqCst) {
            return Err(ShortcutGuardError::Partial(vec![
                "hotkey 52: simulated failure".to_string(),
            ]));
        }
        Ok(())
    }

    async fn enable(&self) -> Result<(), ShortcutGuardError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_enable.load(Ordering::SeqCst) {
            return Err(ShortcutGuardError::Partial(vec![
                "hotkey 52: simulated failure".to_string(),
            ]));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
