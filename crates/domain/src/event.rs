//! Event — an immutable record of a change to the activity list.

use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::id::{ActivityId, EventId};
use crate::time::Timestamp;

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Fired after every successful mutation of the activity list.
    ActivityManagerUpdated,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActivityManagerUpdated => "activity_manager_updated",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the activity carried by an update event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    Added,
    Removed,
    Updated,
    NameAdded,
    NameRemoved,
}

/// A published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub activity_id: Option<ActivityId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(
        event_type: EventType,
        activity_id: Option<ActivityId>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            activity_id,
            data,
            timestamp: crate::time::now(),
        }
    }

    /// An `activity_manager_updated` event with `{ action, item }` data.
    #[must_use]
    pub fn activity_updated(action: UpdateAction, item: &Activity) -> Self {
        Self::new(
            EventType::ActivityManagerUpdated,
            Some(item.id),
            serde_json::json!({ "action": action, "item": item }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_event_type_in_snake_case() {
        let json = serde_json::to_string(&EventType::ActivityManagerUpdated).unwrap();
        assert_eq!(json, "\"activity_manager_updated\"");
        assert_eq!(
            EventType::ActivityManagerUpdated.to_string(),
            "activity_manager_updated"
        );
    }

    #[test]
    fn should_carry_action_and_item() {
        let activity = Activity::builder().name("Dishes").build().unwrap();
        let event = Event::activity_updated(UpdateAction::NameAdded, &activity);

        assert_eq!(event.activity_id, Some(activity.id));
        assert_eq!(event.data["action"], "name_added");
        assert_eq!(event.data["item"]["name"], "Dishes");
        assert_eq!(event.data["item"]["id"], activity.id.to_string());
    }
}
