//! Wrapped-epoch timestamp codec and per-provider instant parsing.
//!
//! Every instant stored in a [`VEvent`](crate::VEvent) uses the wrapped-epoch
//! string format `"/Date(<milliseconds>)/"` regardless of which provider the
//! event came from. This module owns that codec plus the three inbound
//! parsing rules:
//!
//! - Google returns either an RFC 3339 `dateTime` or an all-day `date`
//! - Office365 returns fractional-second timestamps without an explicit zone;
//!   they are truncated to millisecond precision and read as UTC
//! - EWS returns loosely formatted strings that we parse permissively

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors produced while parsing provider timestamps.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    /// The value does not match any supported date format.
    #[error("unsupported or invalid date format: {value}")]
    InvalidFormat {
        /// The offending input.
        value: String,
    },

    /// Neither a datetime nor a date was present where one was required.
    #[error("no dateTime or date present")]
    MissingInstant,
}

/// Formats a UTC instant as a wrapped-epoch string, e.g. `/Date(1700000000000)/`.
pub fn wrap_epoch(instant: DateTime<Utc>) -> String {
    format!("/Date({})/", instant.timestamp_millis())
}

/// Parses a wrapped-epoch string back into a UTC instant.
pub fn unwrap_epoch(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let millis = value
        .strip_prefix("/Date(")
        .and_then(|rest| rest.strip_suffix(")/"))
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(|| TimeParseError::InvalidFormat {
            value: value.to_string(),
        })?;

    DateTime::from_timestamp_millis(millis).ok_or_else(|| TimeParseError::InvalidFormat {
        value: value.to_string(),
    })
}

/// Parses a Google event time object into a UTC instant.
///
/// Google sends either `{"dateTime": "..."}` (RFC 3339) or, for all-day
/// events, `{"date": "YYYY-MM-DD"}`. All-day dates resolve to midnight UTC.
/// An object carrying neither field is a typed invalid-date error.
pub fn parse_google_instant(
    date_time: Option<&str>,
    date: Option<&str>,
) -> Result<DateTime<Utc>, TimeParseError> {
    if let Some(dt) = date_time {
        return DateTime::parse_from_rfc3339(dt)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| TimeParseError::InvalidFormat {
                value: dt.to_string(),
            });
    }

    if let Some(d) = date {
        let parsed =
            NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| TimeParseError::InvalidFormat {
                value: d.to_string(),
            })?;
        let midnight = parsed
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimeParseError::InvalidFormat {
                value: d.to_string(),
            })?;
        return Ok(midnight.and_utc());
    }

    Err(TimeParseError::MissingInstant)
}

/// Parses an Office365 `DateTime` string into a UTC instant.
///
/// The Outlook REST API returns values like `2024-03-15T10:00:00.0000000`
/// with seven fractional digits and no zone designator. The fixed workaround
/// is to truncate to 23 characters (millisecond precision) and read the
/// result as UTC. This is provider-specific, not general ISO 8601 parsing.
pub fn parse_office365_instant(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let truncated = value.get(..23).unwrap_or(value);

    NaiveDateTime::parse_from_str(truncated, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| TimeParseError::InvalidFormat {
            value: value.to_string(),
        })
}

/// Parses an EWS timestamp permissively.
///
/// EWS result strings vary with server configuration; accept RFC 3339 first,
/// then RFC 2822, then a bare datetime read as UTC.
pub fn parse_flexible_instant(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| TimeParseError::InvalidFormat {
            value: value.to_string(),
        })
}
