//! FitBlock library
//!
//! This library provides the core functionality for the FitBlock CLI, a
//! macOS utility that takes over the screen and input for short training
//! breaks. It includes:
//! - The blocking-session controller and its one-shot teardown
//! - System hotkey guard and global input interceptor
//! - Full-screen countdown presenter (shield window or terminal)
//! - Desktop notifications
//! - Statistics persistence and crash recovery
//! - The blocker daemon with its scheduler and IPC server
//! - CLI command parsing, IPC client and display utilities

pub mod cli;
pub mod config;
pub mod daemon;
pub mod interceptor;
pub mod notification;
pub mod presenter;
pub mod privilege;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{AppConfig, AppPaths, TriggerStrategy, BLOCK_DURATION_SECS};
pub use types::{
    IpcRequest, IpcResponse, ResponseData, SessionPhase, SessionStats, StatusSnapshot,
};

pub use session::{SessionController, SessionError, SessionOutcome, SessionReport};

pub use interceptor::{
    InputInterceptor, InterceptorError, InterceptorHandle, MockInputInterceptor,
    PlatformInterceptor,
};

pub use shortcuts::{MockShortcutGuard, ShortcutGuard, ShortcutGuardError, SymbolicHotkeyGuard};

pub use notification::{MockNotifier, NotificationError, Notifier, SystemNotifier};

pub use presenter::{
    CountdownPresenter, FallbackSurface, HeadlessSurface, PlatformSurface, RecordingSurface,
    Surface, TerminalSurface, WindowSurface,
};

pub use store::{LoadOutcome, StateStore, StoreError};
