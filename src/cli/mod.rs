//! CLI module for FitBlock.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for blocker communication
//! - `offline`: State-file operations used when no blocker is running
//! - `display`: Output formatting and display logic

pub mod client;
pub mod commands;
pub mod display;
pub mod offline;

pub use client::IpcClient;
pub use commands::{Cli, Commands, PathArgs, RunArgs};
pub use display::Display;
pub use offline::OfflineStats;
