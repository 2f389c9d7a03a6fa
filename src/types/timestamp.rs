//! ISO-8601 timestamp (de)serialization for persisted state.
//!
//! Timestamps are written as RFC 3339 with the local offset. Reading also
//! accepts naive ISO-8601 timestamps (no offset, optional fraction), which
//! are interpreted in the local time zone.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Formats a timestamp the way it is persisted.
pub fn format(value: &DateTime<Local>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parses an RFC 3339 or naive ISO-8601 timestamp.
pub fn parse(raw: &str) -> Result<DateTime<Local>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| format!("invalid ISO-8601 timestamp '{}': {}", raw, e))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("timestamp '{}' does not exist in the local time zone", raw))
}

pub fn serialize<S>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// Same as the parent module, for optional fields (`null` when absent).
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Local>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse(&s).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2024-03-01T10:15:30.250+00:00").unwrap();
        assert_eq!(dt.with_timezone(&chrono::Utc).hour(), 10);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_naive_with_fraction() {
        let dt = parse("2024-03-01T10:15:30.123456").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 15);
        assert_eq!(dt.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn test_parse_naive_without_fraction() {
        let dt = parse("2024-03-01T10:15:30").unwrap();
        assert_eq!(dt.second(), 30);
        assert_eq!(dt.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse("yesterday").unwrap_err();
        assert!(err.contains("yesterday"));
    }

    #[test]
    fn test_format_parse_preserves_instant() {
        let now = Local::now();
        let parsed = parse(&format(&now)).unwrap();
        assert_eq!(parsed, now);
    }
}
