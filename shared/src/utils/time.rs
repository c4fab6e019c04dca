//! Time-related utilities

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp (e.g. "2024-05-01T12:00:00Z") into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Seconds since UNIX epoch as a float, the unit Prometheus expects for timestamps.
pub fn unix_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
        assert_eq!(unix_seconds(&dt), 1_714_564_800.0);

        let offset = parse_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(offset, dt);

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
