//! Activity — a recurring task with a rotating set of display names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::frequency::Frequency;
use crate::id::ActivityId;
use crate::time::{Timestamp, deserialize_timestamp};

/// A recurring task such as a chore.
///
/// `names` is never empty and `current_name_index` always points into it;
/// every mutating method re-establishes both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ActivityRecord", try_from = "ActivityRecord")]
pub struct Activity {
    pub id: ActivityId,
    pub names: Vec<String>,
    pub current_name_index: usize,
    pub category: String,
    pub frequency: Frequency,
    pub last_completed: Timestamp,
    pub icon: Option<String>,
}

impl Activity {
    /// Create a builder for constructing an [`Activity`].
    #[must_use]
    pub fn builder() -> ActivityBuilder {
        ActivityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoNames`] when `names` is empty,
    /// [`ValidationError::EmptyName`] when one of them is blank and
    /// [`ValidationError::InvalidFrequency`] when the due date falls outside
    /// the representable range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.names.is_empty() {
            return Err(ValidationError::NoNames);
        }
        if self.names.iter().any(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyName);
        }
        if self.checked_due().is_none() {
            return Err(ValidationError::InvalidFrequency {
                value: self.frequency.to_string(),
            });
        }
        Ok(())
    }

    /// The name currently shown for this activity.
    #[must_use]
    pub fn current_name(&self) -> &str {
        self.names
            .get(self.current_name_index)
            .or_else(|| self.names.first())
            .map_or("", String::as_str)
    }

    /// When the activity is next due, or `None` past the end of time.
    #[must_use]
    pub fn checked_due(&self) -> Option<Timestamp> {
        self.last_completed
            .checked_add_signed(self.frequency.as_duration())
    }

    /// When the activity is next due, saturating at the latest
    /// representable instant.
    #[must_use]
    pub fn due(&self) -> Timestamp {
        self.checked_due().unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the due date has been reached at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        now >= self.due()
    }

    /// Record a completion and move on to the next name.
    pub fn complete(&mut self, at: Timestamp) {
        self.last_completed = at;
        self.advance_name();
    }

    /// Rotate to the next name, wrapping around.
    pub fn advance_name(&mut self) {
        if !self.names.is_empty() {
            self.current_name_index = (self.current_name_index + 1) % self.names.len();
        }
    }

    /// Replace the name at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn rename_current(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = non_empty(name.into())?;
        self.clamp_index();
        match self.names.get_mut(self.current_name_index) {
            Some(slot) => *slot = name,
            None => self.names.push(name),
        }
        Ok(())
    }

    /// Append a name to the rotation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn add_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = non_empty(name.into())?;
        self.names.push(name);
        Ok(())
    }

    /// Remove the name at `index`.
    ///
    /// Returns `false` and leaves the activity untouched when `index` is out
    /// of range or when it would remove the last remaining name.
    pub fn remove_name(&mut self, index: usize) -> bool {
        if index >= self.names.len() || self.names.len() <= 1 {
            return false;
        }
        if index <= self.current_name_index && self.current_name_index > 0 {
            self.current_name_index -= 1;
        }
        self.names.remove(index);
        self.clamp_index();
        true
    }

    /// Bring `current_name_index` back into range.
    pub fn clamp_index(&mut self) {
        let last = self.names.len().saturating_sub(1);
        if self.current_name_index > last {
            self.current_name_index = last;
        }
    }
}

fn non_empty(name: String) -> Result<String, ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::EmptyName)
    } else {
        Ok(name)
    }
}

/// Step-by-step builder for [`Activity`].
#[derive(Debug, Default)]
pub struct ActivityBuilder {
    id: Option<ActivityId>,
    names: Vec<String>,
    current_name_index: usize,
    category: String,
    frequency: Frequency,
    last_completed: Option<Timestamp>,
    icon: Option<String>,
}

impl ActivityBuilder {
    #[must_use]
    pub fn id(mut self, id: ActivityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    #[must_use]
    pub fn names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_name_index(mut self, index: usize) -> Self {
        self.current_name_index = index;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    #[must_use]
    pub fn last_completed(mut self, last_completed: Timestamp) -> Self {
        self.last_completed = Some(last_completed);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Consume the builder, validate, and return an [`Activity`].
    ///
    /// Missing `id` and `last_completed` default to a fresh id and now.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if no usable name was given.
    pub fn build(self) -> Result<Activity, ValidationError> {
        let mut activity = Activity {
            id: self.id.unwrap_or_default(),
            names: self.names,
            current_name_index: self.current_name_index,
            category: self.category,
            frequency: self.frequency,
            last_completed: self.last_completed.unwrap_or_else(crate::time::now),
            icon: self.icon,
        };
        activity.validate()?;
        activity.clamp_index();
        Ok(activity)
    }
}

/// On-disk / on-wire shape of an [`Activity`].
///
/// `name` mirrors the current name. Records written before name rotation
/// existed carry only `name`; they load as a single-name activity. An
/// explicit `null` category or frequency reads as the default, and
/// `last_completed` accepts anything [`TimestampInput`] does.
///
/// [`TimestampInput`]: crate::time::TimestampInput
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityRecord {
    id: ActivityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    current_name_index: usize,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    frequency: Option<Frequency>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    last_completed: Timestamp,
    #[serde(default)]
    icon: Option<String>,
}

impl From<Activity> for ActivityRecord {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            name: Some(activity.current_name().to_string()),
            names: Some(activity.names),
            current_name_index: activity.current_name_index,
            category: Some(activity.category),
            frequency: Some(activity.frequency),
            last_completed: activity.last_completed,
            icon: activity.icon,
        }
    }
}

impl TryFrom<ActivityRecord> for Activity {
    type Error = ValidationError;

    fn try_from(record: ActivityRecord) -> Result<Self, Self::Error> {
        let (names, index) = match (record.names, record.name) {
            (Some(names), _) if !names.is_empty() => (names, record.current_name_index),
            (_, Some(name)) => (vec![name], 0),
            _ => return Err(ValidationError::NoNames),
        };
        let mut builder = Activity::builder()
            .id(record.id)
            .names(names)
            .current_name_index(index)
            .category(record.category.unwrap_or_default())
            .frequency(record.frequency.unwrap_or_default())
            .last_completed(record.last_completed);
        if let Some(icon) = record.icon {
            builder = builder.icon(icon);
        }
        builder.build()
    }
}
