//! Frequency — how often an activity should be completed.

use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Recurrence interval, kept in the `days/hours/minutes/seconds` shape the
/// clients send.
///
/// Deserializes from that object, from a plain number of seconds, or from a
/// `"HH:MM[:SS]"` / `"N days, HH:MM:SS"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "FrequencyRepr")]
pub struct Frequency {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Frequency {
    /// A frequency of whole days.
    #[must_use]
    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    /// Build a normalized frequency from a number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFrequency`] when the day count
    /// does not fit.
    pub fn from_seconds(total: u64) -> Result<Self, ValidationError> {
        let days = u32::try_from(total / SECONDS_PER_DAY).map_err(|_| {
            ValidationError::InvalidFrequency {
                value: total.to_string(),
            }
        })?;
        let rest = total % SECONDS_PER_DAY;
        // Each remaining component is bounded by its unit.
        #[allow(clippy::cast_possible_truncation)]
        let (hours, minutes, seconds) = (
            (rest / SECONDS_PER_HOUR) as u32,
            ((rest % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u32,
            (rest % SECONDS_PER_MINUTE) as u32,
        );
        Ok(Self {
            days,
            hours,
            minutes,
            seconds,
        })
    }

    /// Total length in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.days) * SECONDS_PER_DAY
            + u64::from(self.hours) * SECONDS_PER_HOUR
            + u64::from(self.minutes) * SECONDS_PER_MINUTE
            + u64::from(self.seconds)
    }

    /// Total length in milliseconds (the `frequency_ms` sensor attribute).
    #[must_use]
    pub fn total_millis(&self) -> u64 {
        self.total_seconds() * 1000
    }

    /// The frequency as a [`TimeDelta`].
    #[must_use]
    pub fn as_duration(&self) -> TimeDelta {
        // Bounded by u32::MAX days, far below i64::MAX seconds.
        #[allow(clippy::cast_possible_wrap)]
        let seconds = self.total_seconds() as i64;
        TimeDelta::seconds(seconds)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            let unit = if self.days == 1 { "day" } else { "days" };
            write!(f, "{} {unit}, ", self.days)?;
        }
        write!(
            f,
            "{}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Seconds(u64),
    Text(String),
    Parts(FrequencyParts),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FrequencyParts {
    #[serde(default)]
    days: u32,
    #[serde(default)]
    hours: u32,
    #[serde(default)]
    minutes: u32,
    #[serde(default)]
    seconds: u32,
}

impl TryFrom<FrequencyRepr> for Frequency {
    type Error = ValidationError;

    fn try_from(repr: FrequencyRepr) -> Result<Self, Self::Error> {
        match repr {
            FrequencyRepr::Seconds(total) => Self::from_seconds(total),
            FrequencyRepr::Text(text) => text.parse(),
            FrequencyRepr::Parts(parts) => Ok(Self {
                days: parts.days,
                hours: parts.hours,
                minutes: parts.minutes,
                seconds: parts.seconds,
            }),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFrequency {
            value: s.to_string(),
        };
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        let text = s.trim();
        let (day_part, clock_part) = match text.split_once(',') {
            Some((days, clock)) => (Some(days), Some(clock)),
            None if text.contains("day") => (Some(text), None),
            None => (None, Some(text)),
        };

        let mut frequency = Self::default();
        if let Some(day_part) = day_part {
            let count = day_part
                .trim()
                .strip_suffix("days")
                .or_else(|| day_part.trim().strip_suffix("day"))
                .ok_or_else(invalid)?;
            frequency.days = number(count)?;
        }
        if let Some(clock_part) = clock_part {
            let fields: Vec<&str> = clock_part.split(':').collect();
            match fields.as_slice() {
                [hours, minutes] => {
                    frequency.hours = number(hours)?;
                    frequency.minutes = number(minutes)?;
                }
                [hours, minutes, seconds] => {
                    frequency.hours = number(hours)?;
                    frequency.minutes = number(minutes)?;
                    frequency.seconds = number(seconds)?;
                }
                _ => return Err(invalid()),
            }
        }
        Ok(frequency)
    }
}
