//! Activity service — the in-memory activity list manager.
//!
//! Holds every activity keyed by id (in insertion order) together with the
//! entity registry. Each mutation is applied to a copy, the whole list is
//! handed to the [`ActivityStore`], and only then is the change committed
//! and an `activity_manager_updated` event published. Unknown ids and
//! out-of-range name indices are no-ops reported as `Ok(None)`.

use indexmap::IndexMap;
use tokio::sync::Mutex;

use activityhub_domain::activity::Activity;
use activityhub_domain::error::{ActivityHubError, ValidationError};
use activityhub_domain::event::{Event, UpdateAction};
use activityhub_domain::frequency::Frequency;
use activityhub_domain::id::ActivityId;
use activityhub_domain::sensor::SensorEntity;
use activityhub_domain::time::{Timestamp, now};

use crate::entity_registry::EntityRegistry;
use crate::ports::{ActivityStore, EventPublisher};

/// Input for [`ActivityService::add_activity`].
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub names: Vec<String>,
    pub category: String,
    pub frequency: Frequency,
    /// Defaults to the current time.
    pub last_completed: Option<Timestamp>,
    pub icon: Option<String>,
}

/// Partial update for [`ActivityService::update_activity`].
///
/// `None` fields are left untouched. A new `last_completed` counts as a
/// completion and advances the name rotation.
#[derive(Debug, Clone, Default)]
pub struct ActivityUpdate {
    pub last_completed: Option<Timestamp>,
    pub category: Option<String>,
    pub frequency: Option<Frequency>,
    pub icon: Option<String>,
    /// Replaces the name currently shown.
    pub name: Option<String>,
}

impl ActivityUpdate {
    fn is_empty(&self) -> bool {
        self.last_completed.is_none()
            && self.category.is_none()
            && self.frequency.is_none()
            && self.icon.is_none()
            && self.name.is_none()
    }
}

#[derive(Default)]
struct ActivityList {
    items: IndexMap<ActivityId, Activity>,
    registry: EntityRegistry,
}

impl ActivityList {
    fn snapshot(&self) -> Vec<Activity> {
        self.items.values().cloned().collect()
    }
}

/// Application service managing the activity list.
pub struct ActivityService<S, P> {
    store: S,
    publisher: P,
    state: Mutex<ActivityList>,
}

impl<S, P> ActivityService<S, P>
where
    S: ActivityStore + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create an empty service backed by `store`, publishing through `publisher`.
    ///
    /// Call [`initialize`](Self::initialize) to load persisted activities.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            store,
            publisher,
            state: Mutex::new(ActivityList::default()),
        }
    }

    /// Replace the in-memory list with the persisted one and register a
    /// sensor entity for each activity.
    ///
    /// Returns the number of activities loaded.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> Result<usize, ActivityHubError> {
        let loaded = self.store.load().await?;

        let mut state = self.state.lock().await;
        *state = ActivityList::default();
        for activity in loaded {
            if state.items.contains_key(&activity.id) {
                tracing::warn!(activity_id = %activity.id, "duplicate activity id in store, keeping the first");
                continue;
            }
            state.registry.register(&activity);
            state.items.insert(activity.id, activity);
        }

        let count = state.items.len();
        tracing::info!(count, "activities loaded");
        Ok(count)
    }

    /// All activities in insertion order, optionally restricted to one category.
    pub async fn items(&self, category: Option<&str>) -> Vec<Activity> {
        let state = self.state.lock().await;
        state
            .items
            .values()
            .filter(|activity| category.is_none_or(|wanted| activity.category == wanted))
            .cloned()
            .collect()
    }

    /// Look up one activity.
    pub async fn get(&self, id: ActivityId) -> Option<Activity> {
        self.state.lock().await.items.get(&id).cloned()
    }

    /// Activity behind a sensor entity id.
    pub async fn resolve_entity(&self, entity_id: &str) -> Option<ActivityId> {
        self.state.lock().await.registry.resolve(entity_id)
    }

    /// Sensor entity id of an activity.
    pub async fn entity_id(&self, id: ActivityId) -> Option<String> {
        self.state
            .lock()
            .await
            .registry
            .entity_id(id)
            .map(str::to_string)
    }

    /// Sensor projections of every activity, evaluated at `at`.
    pub async fn sensors(&self, at: Timestamp) -> Vec<SensorEntity> {
        let state = self.state.lock().await;
        state
            .items
            .values()
            .filter_map(|activity| {
                let entity_id = state.registry.entity_id(activity.id)?;
                Some(SensorEntity::from_activity(entity_id, activity, at))
            })
            .collect()
    }

    /// Sensor projection for one entity id.
    pub async fn sensor(&self, entity_id: &str, at: Timestamp) -> Option<SensorEntity> {
        let state = self.state.lock().await;
        let id = state.registry.resolve(entity_id)?;
        let activity = state.items.get(&id)?;
        Some(SensorEntity::from_activity(entity_id, activity, at))
    }

    /// Create, persist and register a new activity.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityHubError::Validation`] when no usable name is
    /// given, or a storage error from the store.
    #[tracing::instrument(skip(self, new), fields(category = %new.category))]
    pub async fn add_activity(&self, new: NewActivity) -> Result<Activity, ActivityHubError> {
        let mut builder = Activity::builder()
            .names(new.names)
            .category(new.category)
            .frequency(new.frequency)
            .last_completed(new.last_completed.unwrap_or_else(now));
        if let Some(icon) = new.icon {
            builder = builder.icon(icon);
        }
        let activity = builder.build()?;

        let mut state = self.state.lock().await;
        let mut snapshot = state.snapshot();
        snapshot.push(activity.clone());
        self.store.save(snapshot).await?;

        state.items.insert(activity.id, activity.clone());
        let entity_id = state.registry.register(&activity);
        drop(state);

        tracing::info!(activity_id = %activity.id, %entity_id, "activity added");
        self.notify(UpdateAction::Added, &activity).await;
        Ok(activity)
    }

    /// Delete an activity. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the store; the activity is kept in
    /// that case.
    #[tracing::instrument(skip(self))]
    pub async fn remove_activity(
        &self,
        id: ActivityId,
    ) -> Result<Option<Activity>, ActivityHubError> {
        let mut state = self.state.lock().await;
        if !state.items.contains_key(&id) {
            tracing::debug!("remove ignored, unknown activity");
            return Ok(None);
        }

        let snapshot = state
            .items
            .values()
            .filter(|activity| activity.id != id)
            .cloned()
            .collect();
        self.store.save(snapshot).await?;

        let removed = state.items.shift_remove(&id);
        state.registry.remove(id);
        drop(state);

        if let Some(activity) = &removed {
            tracing::info!(activity_id = %id, "activity removed");
            self.notify(UpdateAction::Removed, activity).await;
        }
        Ok(removed)
    }

    /// Apply a partial update. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityHubError::Validation`] when the new name is blank or
    /// the new frequency pushes the due date out of range, or a storage
    /// error from the store.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_activity(
        &self,
        id: ActivityId,
        update: ActivityUpdate,
    ) -> Result<Option<Activity>, ActivityHubError> {
        if update.is_empty() {
            return Ok(self.get(id).await);
        }
        self.mutate(id, UpdateAction::Updated, move |activity| {
            if let Some(name) = update.name {
                activity.rename_current(name)?;
            }
            if let Some(category) = update.category {
                activity.category = category;
            }
            if let Some(frequency) = update.frequency {
                activity.frequency = frequency;
            }
            if let Some(icon) = update.icon {
                activity.icon = Some(icon);
            }
            if let Some(at) = update.last_completed {
                activity.complete(at);
            }
            Ok(true)
        })
        .await
    }

    /// Append a name to an activity's rotation. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityHubError::Validation`] when `name` is blank, or a
    /// storage error from the store.
    #[tracing::instrument(skip(self, name))]
    pub async fn add_name(
        &self,
        id: ActivityId,
        name: String,
    ) -> Result<Option<Activity>, ActivityHubError> {
        self.mutate(id, UpdateAction::NameAdded, move |activity| {
            activity.add_name(name)?;
            Ok(true)
        })
        .await
    }

    /// Remove the name at `index`. Unknown ids, out-of-range indices and
    /// removing the last name are no-ops.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the store.
    #[tracing::instrument(skip(self))]
    pub async fn remove_name(
        &self,
        id: ActivityId,
        index: usize,
    ) -> Result<Option<Activity>, ActivityHubError> {
        self.mutate(id, UpdateAction::NameRemoved, move |activity| {
            Ok(activity.remove_name(index))
        })
        .await
    }

    /// Run `apply` on a copy of the activity; when it reports a change,
    /// persist the list with the copy in place, commit it and notify.
    async fn mutate<F>(
        &self,
        id: ActivityId,
        action: UpdateAction,
        apply: F,
    ) -> Result<Option<Activity>, ActivityHubError>
    where
        F: FnOnce(&mut Activity) -> Result<bool, ValidationError> + Send,
    {
        let mut state = self.state.lock().await;
        let Some(index) = state.items.get_index_of(&id) else {
            tracing::debug!(activity_id = %id, ?action, "ignored, unknown activity");
            return Ok(None);
        };

        let mut snapshot = state.snapshot();
        let changed = apply(&mut snapshot[index])?;
        if !changed {
            tracing::debug!(activity_id = %id, ?action, "ignored, nothing to change");
            return Ok(None);
        }
        snapshot[index].clamp_index();
        snapshot[index].validate()?;
        let updated = snapshot[index].clone();

        self.store.save(snapshot).await?;
        state.items.insert(id, updated.clone());
        drop(state);

        self.notify(action, &updated).await;
        Ok(Some(updated))
    }

    async fn notify(&self, action: UpdateAction, activity: &Activity) {
        let event = Event::activity_updated(action, activity);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, activity_id = %activity.id, "failed to publish activity event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::InProcessEventBus;
    use activityhub_domain::event::EventType;
    use chrono::{TimeZone, Utc};
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Default)]
    struct InMemoryStore {
        saved: StdMutex<Vec<Activity>>,
        saves: StdMutex<usize>,
        fail: AtomicBool,
    }

    impl ActivityStore for InMemoryStore {
        fn load(&self) -> impl Future<Output = Result<Vec<Activity>, ActivityHubError>> + Send {
            let result = self.saved.lock().unwrap().clone();
            async { Ok(result) }
        }

        fn save(
            &self,
            activities: Vec<Activity>,
        ) -> impl Future<Output = Result<(), ActivityHubError>> + Send {
            let result = if self.fail.load(Ordering::SeqCst) {
                Err(ActivityHubError::Storage(Box::new(std::io::Error::other(
                    "read-only",
                ))))
            } else {
                *self.saved.lock().unwrap() = activities;
                *self.saves.lock().unwrap() += 1;
                Ok(())
            };
            async { result }
        }
    }

    type Service = ActivityService<Arc<InMemoryStore>, Arc<InProcessEventBus>>;

    fn make_service() -> (Service, Arc<InMemoryStore>, Arc<InProcessEventBus>) {
        let store = Arc::new(InMemoryStore::default());
        let bus = Arc::new(InProcessEventBus::new(16));
        let svc = ActivityService::new(Arc::clone(&store), Arc::clone(&bus));
        (svc, store, bus)
    }

    fn new_activity(names: &[&str], category: &str) -> NewActivity {
        NewActivity {
            names: names.iter().map(ToString::to_string).collect(),
            category: category.to_string(),
            frequency: Frequency::days(7),
            last_completed: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            icon: None,
        }
    }

    #[tokio::test]
    async fn should_add_activity_and_persist() {
        let (svc, store, _bus) = make_service();

        let created = svc
            .add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();

        assert_eq!(created.current_name(), "Dishes");
        assert_eq!(svc.items(None).await.len(), 1);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
        assert_eq!(
            svc.resolve_entity("sensor.kitchen_dishes").await,
            Some(created.id)
        );
    }

    #[tokio::test]
    async fn should_default_last_completed_to_now() {
        let (svc, _store, _bus) = make_service();
        let mut new = new_activity(&["Dishes"], "Kitchen");
        new.last_completed = None;

        let before = now();
        let created = svc.add_activity(new).await.unwrap();
        assert!(created.last_completed >= before);
    }

    #[tokio::test]
    async fn should_reject_activity_without_names() {
        let (svc, store, _bus) = make_service();

        let result = svc.add_activity(new_activity(&[], "Kitchen")).await;

        assert!(matches!(
            result,
            Err(ActivityHubError::Validation(ValidationError::NoNames))
        ));
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn should_reject_frequency_overflowing_due_date() {
        let (svc, store, _bus) = make_service();
        let mut new = new_activity(&["Someday"], "Kitchen");
        new.frequency = Frequency::days(u32::MAX);

        let result = svc.add_activity(new).await;

        assert!(matches!(
            result,
            Err(ActivityHubError::Validation(
                ValidationError::InvalidFrequency { .. }
            ))
        ));
        assert_eq!(*store.saves.lock().unwrap(), 0);
        assert!(svc.sensors(now()).await.is_empty());
    }

    #[tokio::test]
    async fn should_reject_update_overflowing_due_date() {
        let (svc, _store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();

        let result = svc
            .update_activity(
                created.id,
                ActivityUpdate {
                    frequency: Some(Frequency::days(u32::MAX)),
                    ..ActivityUpdate::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(ActivityHubError::Validation(
                ValidationError::InvalidFrequency { .. }
            ))
        ));
        assert_eq!(svc.get(created.id).await.unwrap().frequency, Frequency::days(7));
        assert_eq!(svc.sensors(now()).await.len(), 1);
    }

    #[tokio::test]
    async fn should_filter_items_by_category() {
        let (svc, _store, _bus) = make_service();
        svc.add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();
        svc.add_activity(new_activity(&["Mow"], "Garden"))
            .await
            .unwrap();

        let kitchen = svc.items(Some("Kitchen")).await;
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].current_name(), "Dishes");
        assert_eq!(svc.items(None).await.len(), 2);
    }

    #[tokio::test]
    async fn should_publish_event_on_add() {
        let (svc, _store, bus) = make_service();
        let mut rx = bus.subscribe();

        let created = svc
            .add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::ActivityManagerUpdated);
        assert_eq!(event.activity_id, Some(created.id));
        assert_eq!(event.data["action"], "added");
    }

    #[tokio::test]
    async fn should_remove_activity_and_free_entity_id() {
        let (svc, store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();

        let removed = svc.remove_activity(created.id).await.unwrap();

        assert_eq!(removed.map(|a| a.id), Some(created.id));
        assert!(svc.items(None).await.is_empty());
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(svc.resolve_entity("sensor.kitchen_dishes").await.is_none());
    }

    #[tokio::test]
    async fn should_ignore_removal_of_unknown_activity() {
        let (svc, store, _bus) = make_service();
        let removed = svc.remove_activity(ActivityId::new()).await.unwrap();
        assert!(removed.is_none());
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn should_complete_activity_and_rotate_name() {
        let (svc, store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice", "Bob"], "Kitchen"))
            .await
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();

        let updated = svc
            .update_activity(
                created.id,
                ActivityUpdate {
                    last_completed: Some(at),
                    ..ActivityUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.last_completed, at);
        assert_eq!(updated.current_name(), "Bob");
        assert_eq!(store.saved.lock().unwrap()[0].last_completed, at);
    }

    #[tokio::test]
    async fn should_update_fields_without_completing() {
        let (svc, _store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice", "Bob"], "Kitchen"))
            .await
            .unwrap();

        let updated = svc
            .update_activity(
                created.id,
                ActivityUpdate {
                    category: Some("Scullery".to_string()),
                    frequency: Some(Frequency::days(1)),
                    icon: Some("mdi:silverware".to_string()),
                    ..ActivityUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.category, "Scullery");
        assert_eq!(updated.frequency, Frequency::days(1));
        assert_eq!(updated.icon.as_deref(), Some("mdi:silverware"));
        assert_eq!(updated.current_name(), "Alice");
        assert_eq!(updated.last_completed, created.last_completed);
        assert_eq!(
            svc.resolve_entity("sensor.kitchen_alice").await,
            Some(created.id)
        );
    }

    #[tokio::test]
    async fn should_ignore_update_of_unknown_activity() {
        let (svc, _store, _bus) = make_service();
        let result = svc
            .update_activity(
                ActivityId::new(),
                ActivityUpdate {
                    category: Some("x".to_string()),
                    ..ActivityUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_add_and_remove_names() {
        let (svc, _store, bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice"], "Kitchen"))
            .await
            .unwrap();
        let mut rx = bus.subscribe();

        let with_bob = svc
            .add_name(created.id, "Bob".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_bob.names, vec!["Alice", "Bob"]);
        assert_eq!(rx.recv().await.unwrap().data["action"], "name_added");

        let without_alice = svc.remove_name(created.id, 0).await.unwrap().unwrap();
        assert_eq!(without_alice.names, vec!["Bob"]);
        assert_eq!(rx.recv().await.unwrap().data["action"], "name_removed");
    }

    #[tokio::test]
    async fn should_refuse_to_remove_last_name() {
        let (svc, store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice"], "Kitchen"))
            .await
            .unwrap();

        let result = svc.remove_name(created.id, 0).await.unwrap();

        assert!(result.is_none());
        assert_eq!(svc.get(created.id).await.unwrap().names, vec!["Alice"]);
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn should_ignore_out_of_range_name_index() {
        let (svc, _store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice", "Bob"], "Kitchen"))
            .await
            .unwrap();

        assert!(svc.remove_name(created.id, 5).await.unwrap().is_none());
        assert_eq!(svc.get(created.id).await.unwrap().names.len(), 2);
    }

    #[tokio::test]
    async fn should_reject_blank_added_name() {
        let (svc, _store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice"], "Kitchen"))
            .await
            .unwrap();

        let result = svc.add_name(created.id, "   ".to_string()).await;
        assert!(matches!(
            result,
            Err(ActivityHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[tokio::test]
    async fn should_keep_state_when_save_fails() {
        let (svc, store, _bus) = make_service();
        let created = svc
            .add_activity(new_activity(&["Alice"], "Kitchen"))
            .await
            .unwrap();
        store.fail.store(true, Ordering::SeqCst);

        let add = svc.add_activity(new_activity(&["Mow"], "Garden")).await;
        let rename = svc.add_name(created.id, "Bob".to_string()).await;
        let remove = svc.remove_activity(created.id).await;

        assert!(matches!(add, Err(ActivityHubError::Storage(_))));
        assert!(matches!(rename, Err(ActivityHubError::Storage(_))));
        assert!(matches!(remove, Err(ActivityHubError::Storage(_))));
        let items = svc.items(None).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].names, vec!["Alice"]);
    }

    #[tokio::test]
    async fn should_initialize_from_store() {
        let (svc, store, _bus) = make_service();
        let existing = Activity::builder()
            .name("Water plants")
            .category("Garden")
            .build()
            .unwrap();
        store.saved.lock().unwrap().push(existing.clone());
        store.saved.lock().unwrap().push(existing.clone());

        let count = svc.initialize().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(svc.get(existing.id).await, Some(existing.clone()));
        assert_eq!(
            svc.entity_id(existing.id).await.as_deref(),
            Some("sensor.garden_water_plants")
        );
    }

    #[tokio::test]
    async fn should_project_sensors() {
        let (svc, _store, _bus) = make_service();
        svc.add_activity(new_activity(&["Dishes"], "Kitchen"))
            .await
            .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let sensors = svc.sensors(at).await;
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].entity_id, "sensor.kitchen_dishes");
        assert_eq!(sensors[0].state, "2024-01-08T00:00:00+00:00");

        let one = svc.sensor("sensor.kitchen_dishes", at).await.unwrap();
        assert_eq!(one, sensors[0]);
        assert!(svc.sensor("sensor.nope", at).await.is_none());
    }
}
