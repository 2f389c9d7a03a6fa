//! System-wide input interception.
//!
//! While installed, the interceptor consumes every keyboard and pointer
//! event so the user cannot interact with other applications. Installation
//! returns an [`InterceptorHandle`]; releasing the handle (explicitly through
//! [`InputInterceptor::remove`] or by dropping it) uninstalls the filter.

pub mod error;
#[cfg(target_os = "macos")]
pub mod quartz;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use error::InterceptorError;
#[cfg(target_os = "macos")]
pub use quartz::QuartzInterceptor;

// ============================================================================
// Handle
// ============================================================================

/// Opaque ownership of an installed interceptor.
///
/// Releasing is idempotent: a released or null handle does nothing.
#[derive(Default)]
pub struct InterceptorHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl InterceptorHandle {
    /// Wraps the routine that uninstalls the interceptor.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle that owns nothing.
    #[must_use]
    pub fn null() -> Self {
        Self::default()
    }

    /// Returns true until the handle is released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Uninstalls the interceptor if still installed.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for InterceptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// Trait
// ============================================================================

/// Installs and removes the global input filter.
pub trait InputInterceptor {
    /// Starts swallowing input events.
    fn install(&self) -> Result<InterceptorHandle, InterceptorError>;

    /// Stops swallowing input events. Removing a released handle is a no-op.
    fn remove(&self, handle: &mut InterceptorHandle) {
        handle.release();
    }

    fn is_available(&self) -> bool;
}

/// Interceptor for platforms without an implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedInterceptor;

impl InputInterceptor for UnsupportedInterceptor {
    fn install(&self) -> Result<InterceptorHandle, InterceptorError> {
        Err(InterceptorError::PlatformUnavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// The interceptor used by the blocker on this platform.
#[cfg(target_os = "macos")]
pub type PlatformInterceptor = QuartzInterceptor;

/// The interceptor used by the blocker on this platform.
#[cfg(not(target_os = "macos"))]
pub type PlatformInterceptor = UnsupportedInterceptor;

// ============================================================================
// Mock
// ============================================================================

/// Mock interceptor for testing.
///
/// Handles issued by the mock count their release, whether it happens through
/// [`InputInterceptor::remove`] or on drop.
#[derive(Debug)]
pub struct MockInputInterceptor {
    install_calls: AtomicUsize,
    releases: Arc<AtomicUsize>,
    failure: Mutex<Option<InterceptorError>>,
    available: AtomicBool,
}

impl Default for MockInputInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInputInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            install_calls: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
            failure: Mutex::new(None),
            available: AtomicBool::new(true),
        }
    }

    /// Makes subsequent installs fail with the given error.
    pub fn set_failure(&self, failure: Option<InterceptorError>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `install()` calls, failed ones included.
    #[must_use]
    pub fn install_call_count(&self) -> usize {
        self.install_calls.load(Ordering::SeqCst)
    }

    /// Number of issued handles that were released.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl InputInterceptor for MockInputInterceptor {
    fn install(&self) -> Result<InterceptorHandle, InterceptorError> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        let releases = Arc::clone(&self.releases);
        Ok(InterceptorHandle::new(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
