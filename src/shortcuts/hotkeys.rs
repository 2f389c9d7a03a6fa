//! Symbolic hotkey commands.
//!
//! macOS keeps its global keyboard shortcuts in the
//! `com.apple.symbolichotkeys` preferences domain. Each shortcut is a numbered
//! entry under `AppleSymbolicHotKeys`; rewriting an entry with `defaults` and
//! restarting `SystemUIServer` applies the change.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tokio::time::timeout;

use super::error::ShortcutGuardError;

/// Hotkeys disabled for the duration of a session.
pub const GUARDED_HOTKEYS: [(u32, &str); 10] = [
    (52, "Spotlight"),
    (60, "Spotlight menu"),
    (61, "Spotlight window"),
    (64, "Spotlight"),
    (65, "Spotlight"),
    (98, "Mission Control"),
    (32, "Mission Control (F3)"),
    (34, "Application windows"),
    (162, "Move focus to menu bar"),
    (163, "Move focus to Dock"),
];

/// Preferences domain holding the symbolic hotkeys.
pub const HOTKEY_DOMAIN: &str = "com.apple.symbolichotkeys";

/// Dictionary key inside [`HOTKEY_DOMAIN`].
pub const HOTKEY_KEY: &str = "AppleSymbolicHotKeys";

/// Path to the `defaults` tool.
pub const DEFAULTS_PATH: &str = "/usr/bin/defaults";

/// Path to the `killall` tool.
pub const KILLALL_PATH: &str = "/usr/bin/killall";

/// Path to `sudo`, used to write preferences on behalf of another user.
pub const SUDO_PATH: &str = "/usr/bin/sudo";

/// Default timeout for each command in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// Property-list literal written for one hotkey entry.
#[must_use]
pub fn hotkey_entry(enabled: bool) -> String {
    format!(
        r#"{{"enabled" = {}; "value" = {{ "parameters" = (); "type" = "standard"; }};}}"#,
        u8::from(enabled)
    )
}

/// Commands used to rewrite the hotkeys and refresh the system UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCommands {
    /// `defaults` executable
    pub defaults: PathBuf,
    /// `killall` executable
    pub killall: PathBuf,
    /// Write the preferences as this user (the daemon itself runs as root)
    pub run_as_uid: Option<u32>,
    /// Per-command timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for HotkeyCommands {
    fn default() -> Self {
        Self {
            defaults: PathBuf::from(DEFAULTS_PATH),
            killall: PathBuf::from(KILLALL_PATH),
            run_as_uid: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl HotkeyCommands {
    /// Program and arguments that rewrite a single hotkey entry.
    #[must_use]
    pub fn write_invocation(&self, id: u32, enabled: bool) -> (PathBuf, Vec<String>) {
        let mut args = vec![
            "write".to_string(),
            HOTKEY_DOMAIN.to_string(),
            HOTKEY_KEY.to_string(),
            "-dict-add".to_string(),
            id.to_string(),
            hotkey_entry(enabled),
        ];

        match self.run_as_uid {
            Some(uid) => {
                let mut sudo_args = vec![
                    "-n".to_string(),
                    "-u".to_string(),
                    format!("#{}", uid),
                    self.defaults.to_string_lossy().into_owned(),
                ];
                sudo_args.append(&mut args);
                (PathBuf::from(SUDO_PATH), sudo_args)
            }
            None => (self.defaults.clone(), args),
        }
    }

    /// Program and arguments that make the system reload the hotkeys.
    #[must_use]
    pub fn refresh_invocation(&self) -> (PathBuf, Vec<String>) {
        (self.killall.clone(), vec!["SystemUIServer".to_string()])
    }

    /// Rewrites one hotkey entry.
    pub async fn write_hotkey(&self, id: u32, enabled: bool) -> Result<(), ShortcutGuardError> {
        let (program, args) = self.write_invocation(id, enabled);
        run_command(program, args, self.timeout_seconds).await
    }

    /// Restarts `SystemUIServer` so the rewritten hotkeys take effect.
    pub async fn refresh_ui(&self) -> Result<(), ShortcutGuardError> {
        let (program, args) = self.refresh_invocation();
        run_command(program, args, self.timeout_seconds).await
    }
}

/// Runs a command on the blocking pool with a timeout.
pub async fn run_command(
    program: PathBuf,
    args: Vec<String>,
    timeout_seconds: u64,
) -> Result<(), ShortcutGuardError> {
    let label = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned());

    let task = tokio::task::spawn_blocking(move || Command::new(&program).args(&args).output());

    let output = match timeout(Duration::from_secs(timeout_seconds), task).await {
        Ok(joined) => joined
            .map_err(|e| ShortcutGuardError::CommandFailed(label.clone(), format!("task error: {}", e)))?,
        Err(_) => return Err(ShortcutGuardError::Timeout(label, timeout_seconds)),
    };

    let output = match output {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ShortcutGuardError::PlatformUnavailable(label));
        }
        Err(e) => return Err(ShortcutGuardError::CommandFailed(label, e.to_string())),
    };

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        Err(ShortcutGuardError::CommandFailed(label, detail))
    }
}
