use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{CoreError, CoreResult};

// Offset-carrying layouts seen in provider payloads and client bodies,
// e.g. "2023-07-13T20:15+08:00" (schedule timings) or "2023-08-01 12:10:00-04".
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%#z",
    "%Y-%m-%d %H:%M:%S%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp that carries its own UTC offset.
pub fn parse_offset_datetime(value: &str) -> CoreResult<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| CoreError::ValidationError(format!("Invalid timestamp: {}", value)))
}

/// Parse a local timestamp without offset, as used by flight-offer segments.
pub fn parse_naive_datetime(value: &str) -> CoreResult<NaiveDateTime> {
    let value = value.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| CoreError::ValidationError(format!("Invalid local timestamp: {}", value)))
}

/// Parse a timestamp into UTC. A value without offset is taken to be UTC,
/// which is how Postgres reads a naive literal in a UTC session.
pub fn parse_utc_datetime(value: &str) -> CoreResult<DateTime<Utc>> {
    match parse_offset_datetime(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => parse_naive_datetime(value).map(|naive| naive.and_utc()),
    }
}

pub fn parse_date(value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::ValidationError(format!("Invalid date (expected YYYY-MM-DD): {}", value)))
}

pub fn deserialize_utc_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc_datetime(&raw).map_err(serde::de::Error::custom)
}
