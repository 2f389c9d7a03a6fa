//! Blocking-session lifecycle.
//!
//! [`SessionController`] is the core of FitBlock: it starts sessions,
//! suspends input and escape shortcuts, runs the countdown, and restores the
//! system however the session ends.

pub mod controller;
pub mod error;
pub mod teardown;

pub use controller::{
    SessionController, SessionOutcome, SessionReport, ACTIVE_TITLE, COMPLETE_TITLE,
};
pub use error::SessionError;
pub use teardown::TeardownGuard;
