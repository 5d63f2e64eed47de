//! Sensor entity — the read-only projection of an activity.
//!
//! Every activity shows up as one `sensor.*` entity whose state is the due
//! date, so dashboards and automations can react to it like any other
//! timestamp sensor.

mod attribute_value;
mod slug;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use attribute_value::AttributeValue;
pub use slug::slugify;

use crate::activity::Activity;
use crate::id::ActivityId;
use crate::time::Timestamp;

/// Entity-id domain for activity sensors.
pub const SENSOR_DOMAIN: &str = "sensor";

/// Device class advertised by every activity sensor.
pub const DEVICE_CLASS_TIMESTAMP: &str = "timestamp";

/// A sensor entity as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntity {
    pub entity_id: String,
    pub unique_id: ActivityId,
    pub friendly_name: String,
    pub state: String,
    pub device_class: String,
    pub icon: Option<String>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl SensorEntity {
    /// Project `activity` under `entity_id`, evaluating `overdue` at `now`.
    #[must_use]
    pub fn from_activity(entity_id: impl Into<String>, activity: &Activity, now: Timestamp) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("category".to_string(), activity.category.as_str().into());
        attributes.insert(
            "last_completed".to_string(),
            activity.last_completed.to_rfc3339().into(),
        );
        attributes.insert(
            "frequency".to_string(),
            AttributeValue::Json(serde_json::to_value(activity.frequency).unwrap_or_default()),
        );
        attributes.insert(
            "frequency_ms".to_string(),
            AttributeValue::Int(i64::try_from(activity.frequency.total_millis()).unwrap_or(i64::MAX)),
        );
        attributes.insert(
            "names".to_string(),
            AttributeValue::Json(serde_json::Value::from(activity.names.clone())),
        );
        attributes.insert(
            "current_name_index".to_string(),
            AttributeValue::Int(i64::try_from(activity.current_name_index).unwrap_or(i64::MAX)),
        );
        attributes.insert("overdue".to_string(), activity.is_overdue(now).into());

        Self {
            entity_id: entity_id.into(),
            unique_id: activity.id,
            friendly_name: activity.current_name().to_string(),
            state: activity.due().to_rfc3339(),
            device_class: DEVICE_CLASS_TIMESTAMP.to_string(),
            icon: activity.icon.clone(),
            attributes,
        }
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// The entity id an activity would get if nothing else had claimed it:
/// `sensor.<category>_<name>`.
#[must_use]
pub fn suggested_entity_id(activity: &Activity) -> String {
    let object_id = if activity.category.trim().is_empty() {
        slugify(activity.current_name())
    } else {
        slugify(&format!("{}_{}", activity.category, activity.current_name()))
    };
    format!("{SENSOR_DOMAIN}.{object_id}")
}
