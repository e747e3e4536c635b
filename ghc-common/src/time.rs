//! Timestamp utilities
//!
//! Timestamps are stored as fixed-width RFC 3339 text with microsecond
//! precision (`2025-01-02T03:04:05.000006Z`), so `ORDER BY ts` on the text
//! column is chronological.

use chrono::{DateTime, SubsecRound, Utc};

use crate::{Error, Result};

/// Storage format for timestamp columns
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Get current UTC timestamp, truncated to the precision the database keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for a TEXT column
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp read from a TEXT column
pub fn from_db(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRow(format!("Invalid stored timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
        assert_eq!(timestamp.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_db_format_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(to_db(&whole), "2025-01-02T03:04:05.000000Z");

        let later = whole + chrono::Duration::microseconds(6);
        assert_eq!(to_db(&later), "2025-01-02T03:04:05.000006Z");
        assert!(to_db(&later) > to_db(&whole));
    }

    #[test]
    fn test_db_round_trip() {
        let ts = now();
        assert_eq!(from_db(&to_db(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_from_db_rejects_garbage() {
        assert!(matches!(from_db("yesterday"), Err(Error::CorruptRow(_))));
    }
}
