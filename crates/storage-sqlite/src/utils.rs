use chrono::{DateTime, TimeZone, Utc};
use log::warn;

/// Epoch milliseconds to UTC. Out-of-range values collapse to the epoch, which reads as expired.
pub fn datetime_from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Parses a stored RFC 3339 column. Unparseable values are logged and treated as absent.
pub fn parse_timestamp(column: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring malformed {} '{}': {}", column, raw, e);
            None
        }
    }
}
