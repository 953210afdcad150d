//! Timestamp parsing for the loosely formatted dates the services return.
//!
//! Accepted forms, tried in order:
//! - RFC 3339 (`2024-01-02T10:00:00+01:00`, `...Z`)
//! - ISO 8601 with a compact offset (`2024-01-02T10:00:00+0100`)
//! - Unzoned date-time (`2024-01-02T10:00:00`, `2024-01-02 10:00:00`),
//!   interpreted in the given civil timezone
//! - Unix seconds (`1704186000`)

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Civil timezone used when a timestamp carries no offset
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Amsterdam;

const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const UNZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Unrecognized timestamp: {0}")]
    Unrecognized(String),

    #[error("Timestamp {value} does not exist in timezone {zone}")]
    NonexistentLocalTime { value: String, zone: String },

    #[error("Unknown timezone: {0}")]
    UnknownZone(String),
}

/// Parse a timestamp, falling back to `zone` for unzoned values
pub fn parse_timestamp(raw: &str, zone: Tz) -> Result<DateTime<Utc>, TimestampError> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ZONED_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in UNZONED_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            // DST overlaps resolve to the earlier instant
            return zone
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| TimestampError::NonexistentLocalTime {
                    value: value.to_string(),
                    zone: zone.name().to_string(),
                });
        }
    }

    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(parsed) = value.parse::<i64>().ok().and_then(|secs| Utc.timestamp_opt(secs, 0).single()) {
            return Ok(parsed);
        }
    }

    Err(TimestampError::Unrecognized(value.to_string()))
}

/// Parse an IANA timezone name such as `Europe/Amsterdam`
pub fn parse_zone(name: &str) -> Result<Tz, TimestampError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TimestampError::UnknownZone(name.to_string()))
}
