//! ISO-8601 timestamp (de)serialization for offer and authorization fields.
//!
//! Offers carry an absolute `expires_at` instant; authorizations carry a
//! client-side `timestamp`. Both travel as ISO-8601 strings. Timestamps
//! without an explicit offset are treated as UTC rather than rejected,
//! since some issuers emit naive datetimes.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parses an ISO-8601 datetime string, assuming UTC when no offset is given.
///
/// # Errors
///
/// Returns the input back if it parses as neither an RFC 3339 datetime nor
/// a naive `YYYY-MM-DDTHH:MM:SS[.fff]` datetime.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("malformed timestamp: {s}"))
}

/// Formats a datetime as RFC 3339 with a `Z` suffix.
#[must_use]
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn serialize<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_iso8601(dt))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_iso8601(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_iso8601("2026-01-02T03:04:05+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 2, 1, 4, 5).unwrap());
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let dt = parse_iso8601("2026-01-02T03:04:05").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_iso8601("tomorrow").is_err());
        assert!(parse_iso8601("2026-13-40T99:00:00Z").is_err());
    }

    #[test]
    fn format_parse_round_trip() {
        let now = Utc::now();
        assert_eq!(parse_iso8601(&format_iso8601(&now)).unwrap(), now);
    }
}
