//! Entity registry — stable mapping between sensor entity ids and activities.
//!
//! An activity keeps the entity id it was first registered under, even when
//! its name or category changes later. Services address activities by entity
//! id; the socket API addresses them by activity id.

use std::collections::HashMap;

use activityhub_domain::activity::Activity;
use activityhub_domain::id::ActivityId;
use activityhub_domain::sensor::suggested_entity_id;

/// Bidirectional `entity_id <-> ActivityId` map.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    by_entity_id: HashMap<String, ActivityId>,
    by_activity: HashMap<ActivityId, String>,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `activity` and return its entity id.
    ///
    /// Registering the same activity again returns the id it already has.
    /// A taken suggestion gets a numeric suffix (`_2`, `_3`, …).
    pub fn register(&mut self, activity: &Activity) -> String {
        if let Some(existing) = self.by_activity.get(&activity.id) {
            return existing.clone();
        }

        let base = suggested_entity_id(activity);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.by_entity_id.contains_key(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.by_entity_id.insert(candidate.clone(), activity.id);
        self.by_activity.insert(activity.id, candidate.clone());
        candidate
    }

    /// Activity registered under `entity_id`, if any.
    #[must_use]
    pub fn resolve(&self, entity_id: &str) -> Option<ActivityId> {
        self.by_entity_id.get(entity_id).copied()
    }

    /// Entity id of `activity_id`, if registered.
    #[must_use]
    pub fn entity_id(&self, activity_id: ActivityId) -> Option<&str> {
        self.by_activity.get(&activity_id).map(String::as_str)
    }

    /// Forget `activity_id`, freeing its entity id. Returns the freed id.
    pub fn remove(&mut self, activity_id: ActivityId) -> Option<String> {
        let entity_id = self.by_activity.remove(&activity_id)?;
        self.by_entity_id.remove(&entity_id);
        Some(entity_id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_activity.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_activity.is_empty()
    }
}
