//! Command definitions for the FitBlock CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::TriggerStrategy;

// ============================================================================
// CLI Structure
// ============================================================================

/// FitBlock - enforced movement breaks for macOS
#[derive(Parser, Debug)]
#[command(
    name = "fitblock",
    version,
    about = "Blocks the screen and input for a short training break",
    long_about = "Takes over the screen, keyboard and mouse for two minutes so you get up \
                  and move.\nRun without a subcommand to start the blocker; use the \
                  subcommands to control a running blocker.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub paths: PathArgs,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the blocker (the default when no subcommand is given)
    Run(RunArgs),

    /// Ask the running blocker to start a session now
    Start,

    /// Pause future sessions
    Pause,

    /// Resume sessions after a pause
    Resume,

    /// Reset the session statistics
    Reset,

    /// Show blocker status and statistics
    Status,

    /// Stop the running blocker, ending any session
    Quit,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// When to start sessions: immediate or scheduled-hourly
    /// (defaults to the config file setting)
    #[arg(short, long)]
    pub trigger: Option<TriggerStrategy>,

    /// Uid of the user the elevated blocker works for
    #[arg(long, hide = true)]
    pub owner_uid: Option<u32>,

    /// Do not try to gain administrator privileges
    #[arg(long, hide = true)]
    pub no_elevate: bool,
}

/// File location overrides, mainly passed to the elevated blocker.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Path of the statistics file
    #[arg(long, global = true, hide = true)]
    pub state_file: Option<PathBuf>,

    /// Path of the config file
    #[arg(long, global = true, hide = true)]
    pub config: Option<PathBuf>,

    /// Path of the blocker's IPC socket
    #[arg(long, global = true, hide = true)]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Tests
// ============================================================================
