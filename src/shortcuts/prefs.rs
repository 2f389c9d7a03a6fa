//! Reading the current hotkey state from the preferences file.

use std::path::{Path, PathBuf};

use plist::Value;

use super::error::ShortcutGuardError;
use super::hotkeys::{GUARDED_HOTKEYS, HOTKEY_DOMAIN, HOTKEY_KEY};

/// Enabled flag of one guarded hotkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyState {
    /// Symbolic hotkey identifier
    pub id: u32,
    /// Human-readable name
    pub name: &'static str,
    /// `None` if the entry is absent (the system default applies)
    pub enabled: Option<bool>,
}

/// Location of the symbolic hotkeys preferences below a home directory.
#[must_use]
pub fn preferences_path(home: &Path) -> PathBuf {
    home.join("Library")
        .join("Preferences")
        .join(format!("{}.plist", HOTKEY_DOMAIN))
}

/// Reads the enabled flags of all guarded hotkeys.
pub fn read_hotkey_states(path: &Path) -> Result<Vec<HotkeyState>, ShortcutGuardError> {
    let root = Value::from_file(path)
        .map_err(|e| ShortcutGuardError::Preferences(path.to_path_buf(), e.to_string()))?;

    let hotkeys = root
        .as_dictionary()
        .and_then(|dict| dict.get(HOTKEY_KEY))
        .and_then(Value::as_dictionary);

    Ok(GUARDED_HOTKEYS
        .iter()
        .map(|&(id, name)| {
            let enabled = hotkeys
                .and_then(|dict| dict.get(&id.to_string()))
                .and_then(Value::as_dictionary)
                .and_then(|entry| entry.get("enabled"))
                .and_then(as_flag);
            HotkeyState { id, name, enabled }
        })
        .collect())
}

/// `defaults` writes integers; System Settings writes booleans.
fn as_flag(value: &Value) -> Option<bool> {
    value
        .as_boolean()
        .or_else(|| value.as_signed_integer().map(|n| n != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Dictionary;

    fn entry(enabled: Value) -> Value {
        let mut dict = Dictionary::new();
        dict.insert("enabled".to_string(), enabled);
        Value::Dictionary(dict)
    }

    fn write_prefs(path: &Path, entries: Vec<(u32, Value)>) {
        let mut hotkeys = Dictionary::new();
        for (id, value) in entries {
            hotkeys.insert(id.to_string(), entry(value));
        }
        let mut root = Dictionary::new();
        root.insert(HOTKEY_KEY.to_string(), Value::Dictionary(hotkeys));
        Value::Dictionary(root).to_file_xml(path).unwrap();
    }

    #[test]
    fn test_preferences_path() {
        assert_eq!(
            preferences_path(Path::new("/Users/tester")),
            PathBuf::from("/Users/tester/Library/Preferences/com.apple.symbolichotkeys.plist")
        );
    }

    #[test]
    fn test_read_states() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.plist");
        write_prefs(
            &path,
            vec![
                (52, Value::Integer(0.into())),
                (60, Value::Boolean(true)),
                (98, Value::Integer(1.into())),
            ],
        );

        let states = read_hotkey_states(&path).unwrap();
        assert_eq!(states.len(), GUARDED_HOTKEYS.len());

        let by_id = |id: u32| states.iter().find(|s| s.id == id).unwrap().enabled;
        assert_eq!(by_id(52), Some(false));
        assert_eq!(by_id(60), Some(true));
        assert_eq!(by_id(98), Some(true));
        assert_eq!(by_id(163), None);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_hotkey_states(&dir.path().join("missing.plist"));
        assert!(matches!(result, Err(ShortcutGuardError::Preferences(_, _))));
    }

    #[test]
    fn test_read_without_hotkey_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.plist");
        Value::Dictionary(Dictionary::new()).to_file_xml(&path).unwrap();

        let states = read_hotkey_states(&path).unwrap();
        assert!(states.iter().all(|s| s.enabled.is_none()));
    }
}
