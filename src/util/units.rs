//! Units formatting and conversion utilities
//!
//! Human-readable sizes (via `byte-unit`) and durations (via `humantime`),
//! plus serde adapters so the config file can say `"1 GiB"` or `"60s"`.

use byte_unit::{Byte, UnitType};
use std::time::Duration;

/// Format bytes into human-readable size with binary units
///
/// # Examples
/// ```
/// use studydesk::util::units::format_bytes;
///
/// assert!(format_bytes(1536).contains("KiB"));
/// assert_eq!(format_bytes(0), "0 B");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.1}", adjusted)
}

/// Parse human-readable size string into bytes
///
/// # Examples
/// ```
/// use studydesk::util::units::parse_bytes;
///
/// assert_eq!(parse_bytes("1 KiB").unwrap(), 1024);
/// assert_eq!(parse_bytes("2 GB").unwrap(), 2_000_000_000);
/// ```
pub fn parse_bytes(input: &str) -> Result<u64, String> {
    Byte::parse_str(input.trim(), true)
        .map(|b| b.as_u64())
        .map_err(|e| format!("Invalid size '{}': {}", input, e))
}

/// Format duration into human-readable string
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Parse duration strings like `30s`, `2m`, `1h 30m`
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim())
        .map_err(|e| format!("Invalid duration '{}': {}", input, e))
}

/// Serde adapter storing a `Duration` as a humantime string
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter storing a byte count as a size string
pub mod bytes_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_bytes(*bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_bytes(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert!(format_bytes(1536).contains("KiB"));
        assert!(format_bytes(5 * 1024 * 1024).contains("MiB"));
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_bytes("1 KiB").unwrap(), 1024);
        assert_eq!(parse_bytes("1 GiB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_bytes("2 GB").unwrap(), 2_000_000_000);
        assert!(parse_bytes("lots").is_err());
    }

    #[test]
    fn test_duration_round_trip_strings() {
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert!(parse_duration("soon").is_err());
    }
}
