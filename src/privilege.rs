//! Privilege elevation for the blocker.
//!
//! Toggling system hotkeys for every user session and installing a
//! session-wide event tap both need root. When started unprivileged the CLI
//! re-executes itself through `sudo` (interactive terminal) or through an
//! AppleScript administrator prompt (no terminal), passing along the paths
//! it resolved and the uid it runs for.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::{AppPaths, TriggerStrategy};
use crate::notification::backend::applescript_string;

/// Path to `sudo`.
pub const SUDO_PATH: &str = "/usr/bin/sudo";

/// Path to `osascript`.
pub const OSASCRIPT_PATH: &str = "/usr/bin/osascript";

/// AppleScript error number for a cancelled authorization prompt.
const USER_CANCELED: &str = "-128";

// ============================================================================
// ElevationError
// ============================================================================

/// Errors that prevent the blocker from gaining root.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// The path of the running executable is unknown.
    #[error("Could not locate the fitblock executable: {0}")]
    CurrentExe(#[source] io::Error),

    /// The elevation helper could not be started.
    #[error("Failed to launch {0}: {1}")]
    Spawn(String, #[source] io::Error),

    /// The user declined the administrator prompt.
    #[error("Administrator privileges were refused")]
    Refused,
}

impl ElevationError {
    /// Elevation failures always end the process.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Returns a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::CurrentExe(_) => "Run fitblock from its installed location",
            Self::Spawn(_, _) => "Run `sudo fitblock` manually",
            Self::Refused => "FitBlock needs administrator privileges to block input",
        }
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Returns true if the process runs as root.
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Real uid of the invoking user.
pub fn invoking_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail
    unsafe { libc::getuid() }
}

// ============================================================================
// Relaunch
// ============================================================================

/// How the elevated child is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevator {
    /// `sudo`, prompting on the terminal
    Sudo,
    /// `osascript ... with administrator privileges`, prompting in a dialog
    Osascript,
}

impl Elevator {
    /// Picks `sudo` when stdin is a terminal, the GUI prompt otherwise.
    pub fn detect() -> Self {
        if io::stdin().is_terminal() {
            Elevator::Sudo
        } else {
            Elevator::Osascript
        }
    }
}

/// Command line of the elevated blocker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relaunch {
    exe: PathBuf,
    args: Vec<String>,
}

impl Relaunch {
    /// Builds the child command line from what this process resolved.
    pub fn new(
        exe: impl Into<PathBuf>,
        trigger: TriggerStrategy,
        paths: &AppPaths,
        owner_uid: u32,
        verbose: bool,
    ) -> Self {
        let mut args = vec![
            "run".to_string(),
            "--trigger".to_string(),
            trigger.as_str().to_string(),
            "--state-file".to_string(),
            path_arg(&paths.state_file),
            "--config".to_string(),
            path_arg(&paths.config_file),
            "--socket".to_string(),
            path_arg(&paths.socket),
            "--owner-uid".to_string(),
            owner_uid.to_string(),
            "--no-elevate".to_string(),
        ];
        if verbose {
            args.push("--verbose".to_string());
        }

        Self {
            exe: exe.into(),
            args,
        }
    }

    /// Uses the path of the running executable.
    pub fn for_current_exe(
        trigger: TriggerStrategy,
        paths: &AppPaths,
        owner_uid: u32,
        verbose: bool,
    ) -> Result<Self, ElevationError> {
        let exe = std::env::current_exe().map_err(ElevationError::CurrentExe)?;
        Ok(Self::new(exe, trigger, paths, owner_uid, verbose))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The full command line as one shell string.
    pub fn shell_command(&self) -> String {
        std::iter::once(path_arg(&self.exe))
            .chain(self.args.iter().cloned())
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// AppleScript that runs the command with an administrator prompt.
    pub fn applescript(&self) -> String {
        format!(
            "do shell script {} with administrator privileges",
            applescript_string(&self.shell_command())
        )
    }

    /// Runs the elevated child to completion and returns its exit status.
    pub fn run(&self, elevator: Elevator) -> Result<i32, ElevationError> {
        tracing::info!("Requesting administrator privileges via {:?}", elevator);

        match elevator {
            Elevator::Sudo => {
                let status = Command::new(SUDO_PATH)
                    .arg(&self.exe)
                    .args(&self.args)
                    .status()
                    .map_err(|e| ElevationError::Spawn(SUDO_PATH.to_string(), e))?;
                Ok(status.code().unwrap_or(1))
            }
            Elevator::Osascript => {
                let output = Command::new(OSASCRIPT_PATH)
                    .arg("-e")
                    .arg(self.applescript())
                    .output()
                    .map_err(|e| ElevationError::Spawn(OSASCRIPT_PATH.to_string(), e))?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if stderr.contains(USER_CANCELED) {
                        return Err(ElevationError::Refused);
                    }
                    tracing::warn!("Elevated blocker failed: {}", stderr.trim());
                }
                Ok(output.status.code().unwrap_or(1))
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Quotes one argument for `/bin/sh`.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+".contains(c));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
