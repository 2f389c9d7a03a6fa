//! Notification backends.

use std::path::{Path, PathBuf};

/// Available notification backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `terminal-notifier`
    TerminalNotifier,
    /// `osascript -e 'display notification ...'`
    Osascript,
}

impl Backend {
    /// Detects the best available backend.
    ///
    /// Prefers `terminal-notifier`, then `osascript`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        if find_in_path("terminal-notifier").is_some() {
            Some(Self::TerminalNotifier)
        } else if find_in_path("osascript").is_some() {
            Some(Self::Osascript)
        } else {
            None
        }
    }

    /// Name of the backend executable.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => "terminal-notifier",
            Self::Osascript => "osascript",
        }
    }

    /// Arguments that deliver one notification with this backend.
    #[must_use]
    pub fn args(&self, title: &str, message: &str, icon: Option<&Path>) -> Vec<String> {
        match self {
            Self::TerminalNotifier => {
                let mut args = vec![
                    "-title".to_string(),
                    title.to_string(),
                    "-message".to_string(),
                    message.to_string(),
                    "-group".to_string(),
                    "fitblock".to_string(),
                ];
                if let Some(icon) = icon {
                    args.push("-appIcon".to_string());
                    args.push(icon.to_string_lossy().into_owned());
                }
                args
            }
            Self::Osascript => vec![
                "-e".to_string(),
                format!(
                    "display notification {} with title {}",
                    applescript_string(message),
                    applescript_string(title)
                ),
            ],
        }
    }
}

/// Quotes a value as an AppleScript string literal.
#[must_use]
pub fn applescript_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' | '\r' => quoted.push(' '),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Looks up an executable on `PATH`.
#[must_use]
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        assert_eq!(Backend::TerminalNotifier.name(), "terminal-notifier");
        assert_eq!(Backend::Osascript.name(), "osascript");
    }

    #[test]
    fn test_terminal_notifier_args() {
        let args = Backend::TerminalNotifier.args("⚡ FitBlock Active", "Session #3 - 120 seconds", None);
        assert_eq!(
            args,
            vec![
                "-title",
                "⚡ FitBlock Active",
                "-message",
                "Session #3 - 120 seconds",
                "-group",
                "fitblock"
            ]
        );
    }

    #[test]
    fn test_terminal_notifier_icon() {
        let args = Backend::TerminalNotifier.args("t", "m", Some(Path::new("/tmp/icon.icns")));
        assert_eq!(&args[6..], &["-appIcon", "/tmp/icon.icns"]);
    }

    #[test]
    fn test_osascript_args() {
        let args = Backend::Osascript.args("Title", "Say \"hi\"", None);
        assert_eq!(args[0], "-e");
        assert_eq!(
            args[1],
            r#"display notification "Say \"hi\"" with title "Title""#
        );
    }

    #[test]
    fn test_applescript_string_escaping() {
        assert_eq!(applescript_string("plain"), "\"plain\"");
        assert_eq!(applescript_string(r"a\b"), r#""a\\b""#);
        assert_eq!(applescript_string("two\nlines"), "\"two lines\"");
    }

    #[test]
    fn test_find_in_path_missing() {
        assert!(find_in_path("definitely-not-a-real-binary-fitblock").is_none());
    }
}
