//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;

/// UTC timestamp used for `last_completed`, due dates, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Integers at or above this magnitude are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A timestamp as supplied by a caller: Unix time or a date-time string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimestampInput {
    Epoch(i64),
    Text(String),
}

impl TimestampInput {
    /// Resolve the input to a UTC [`Timestamp`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] when the value cannot be
    /// interpreted as a point in time.
    pub fn resolve(&self) -> Result<Timestamp, ValidationError> {
        match self {
            Self::Epoch(value) => from_epoch(*value),
            Self::Text(text) => parse_timestamp(text),
        }
    }
}

impl From<Timestamp> for TimestampInput {
    fn from(value: Timestamp) -> Self {
        Self::Text(value.to_rfc3339())
    }
}

/// Interpret a Unix time given in seconds, or in milliseconds when the
/// magnitude is large enough to be unambiguous.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] when out of range.
pub fn from_epoch(value: i64) -> Result<Timestamp, ValidationError> {
    let parsed = if value.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    parsed.ok_or_else(|| ValidationError::InvalidTimestamp {
        value: value.to_string(),
    })
}

/// Deserialize a [`Timestamp`] from any form [`TimestampInput`] accepts.
///
/// # Errors
///
/// Fails when the value is neither an integer nor a parseable string.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    TimestampInput::deserialize(deserializer)?
        .resolve()
        .map_err(serde::de::Error::custom)
}

/// Parse RFC 3339, a naive date-time (taken as UTC), a bare date (midnight
/// UTC) or a string holding a Unix time.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] when no format matches.
pub fn parse_timestamp(text: &str) -> Result<Timestamp, ValidationError> {
    let text = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Ok(value.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(value.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    if let Ok(value) = text.parse::<i64>() {
        return from_epoch(value);
    }
    Err(ValidationError::InvalidTimestamp {
        value: text.to_string(),
    })
}
