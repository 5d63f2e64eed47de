//! Service dispatcher — named `activity_manager.*` services with JSON payloads.
//!
//! Services address activities by sensor entity id and resolve them through
//! the entity registry. An entity id that resolves to nothing is skipped
//! silently, the same way a missing `entity_id` is.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use activityhub_domain::activity::Activity;
use activityhub_domain::error::{ActivityHubError, NotFoundError, ValidationError};
use activityhub_domain::frequency::Frequency;
use activityhub_domain::id::ActivityId;
use activityhub_domain::time::{TimestampInput, now};

use crate::ports::{ActivityStore, EventPublisher};
use crate::services::activity_service::{ActivityService, ActivityUpdate, NewActivity};

/// Service domain owned by this application.
pub const DOMAIN: &str = "activity_manager";

pub const ADD_ACTIVITY: &str = "add_activity";
pub const REMOVE_ACTIVITY: &str = "remove_activity";
pub const UPDATE_ACTIVITY: &str = "update_activity";
pub const ADD_NAME: &str = "add_name";
pub const REMOVE_NAME: &str = "remove_name";

/// Human-readable description of a registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescription {
    pub domain: &'static str,
    pub service: &'static str,
    pub description: &'static str,
    pub fields: &'static [&'static str],
}

const DESCRIPTIONS: [ServiceDescription; 5] = [
    ServiceDescription {
        domain: DOMAIN,
        service: ADD_ACTIVITY,
        description: "Add a new activity",
        fields: &["name", "names", "category", "frequency", "last_completed", "icon"],
    },
    ServiceDescription {
        domain: DOMAIN,
        service: REMOVE_ACTIVITY,
        description: "Remove an activity",
        fields: &["entity_id"],
    },
    ServiceDescription {
        domain: DOMAIN,
        service: UPDATE_ACTIVITY,
        description: "Update or complete an activity",
        fields: &["entity_id", "last_completed", "now", "category", "frequency", "icon"],
    },
    ServiceDescription {
        domain: DOMAIN,
        service: ADD_NAME,
        description: "Add a name to an activity's rotation",
        fields: &["entity_id", "name"],
    },
    ServiceDescription {
        domain: DOMAIN,
        service: REMOVE_NAME,
        description: "Remove a name from an activity's rotation by index",
        fields: &["entity_id", "index"],
    },
];

/// Every service the dispatcher answers to.
#[must_use]
pub fn descriptions() -> &'static [ServiceDescription] {
    &DESCRIPTIONS
}

/// One entity id or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityTarget {
    One(String),
    Many(Vec<String>),
}

impl EntityTarget {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(entity_id) => vec![entity_id],
            Self::Many(entity_ids) => entity_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddActivityData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    frequency: Frequency,
    #[serde(default)]
    last_completed: Option<TimestampInput>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveActivityData {
    #[serde(default)]
    entity_id: Option<EntityTarget>,
}

#[derive(Debug, Deserialize)]
struct UpdateActivityData {
    #[serde(default)]
    entity_id: Option<EntityTarget>,
    #[serde(default)]
    last_completed: Option<TimestampInput>,
    #[serde(default)]
    now: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    frequency: Option<Frequency>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddNameData {
    #[serde(default)]
    entity_id: Option<EntityTarget>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveNameData {
    #[serde(default)]
    entity_id: Option<EntityTarget>,
    #[serde(default)]
    index: Option<i64>,
}

/// Routes service calls to the [`ActivityService`].
pub struct ServiceDispatcher<S, P> {
    activities: Arc<ActivityService<S, P>>,
}

impl<S, P> Clone for ServiceDispatcher<S, P> {
    fn clone(&self) -> Self {
        Self {
            activities: Arc::clone(&self.activities),
        }
    }
}

impl<S, P> ServiceDispatcher<S, P>
where
    S: ActivityStore + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    /// Create a dispatcher over a shared activity service.
    pub fn new(activities: Arc<ActivityService<S, P>>) -> Self {
        Self { activities }
    }

    /// Invoke `domain.service` with `data`.
    ///
    /// Returns the activities the call created or changed; a call that
    /// matched nothing returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityHubError::NotFound`] for an unknown service,
    /// [`ActivityHubError::Validation`] for a malformed payload, or a
    /// storage error from the activity service.
    #[tracing::instrument(skip(self, data))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        data: serde_json::Value,
    ) -> Result<Vec<Activity>, ActivityHubError> {
        if domain != DOMAIN {
            return Err(unknown_service(domain, service));
        }
        match service {
            ADD_ACTIVITY => self.add_activity(parse(ADD_ACTIVITY, data)?).await,
            REMOVE_ACTIVITY => self.remove_activity(parse(REMOVE_ACTIVITY, data)?).await,
            UPDATE_ACTIVITY => self.update_activity(parse(UPDATE_ACTIVITY, data)?).await,
            ADD_NAME => self.add_name(parse(ADD_NAME, data)?).await,
            REMOVE_NAME => self.remove_name(parse(REMOVE_NAME, data)?).await,
            _ => Err(unknown_service(domain, service)),
        }
    }

    async fn add_activity(&self, data: AddActivityData) -> Result<Vec<Activity>, ActivityHubError> {
        let names = match (data.names, data.name) {
            (Some(names), _) if !names.is_empty() => names,
            (_, Some(name)) => vec![name],
            _ => Vec::new(),
        };
        let last_completed = data
            .last_completed
            .map(|input| input.resolve())
            .transpose()?;

        let created = self
            .activities
            .add_activity(NewActivity {
                names,
                category: data.category,
                frequency: data.frequency,
                last_completed,
                icon: data.icon,
            })
            .await?;
        Ok(vec![created])
    }

    async fn remove_activity(
        &self,
        data: RemoveActivityData,
    ) -> Result<Vec<Activity>, ActivityHubError> {
        let mut changed = Vec::new();
        for id in self.resolve(data.entity_id).await {
            changed.extend(self.activities.remove_activity(id).await?);
        }
        Ok(changed)
    }

    async fn update_activity(
        &self,
        data: UpdateActivityData,
    ) -> Result<Vec<Activity>, ActivityHubError> {
        let last_completed = if data.now {
            Some(now())
        } else {
            data.last_completed
                .map(|input| input.resolve())
                .transpose()?
        };
        let update = ActivityUpdate {
            last_completed,
            category: data.category,
            frequency: data.frequency,
            icon: data.icon,
            name: None,
        };

        let mut changed = Vec::new();
        for id in self.resolve(data.entity_id).await {
            changed.extend(self.activities.update_activity(id, update.clone()).await?);
        }
        Ok(changed)
    }

    async fn add_name(&self, data: AddNameData) -> Result<Vec<Activity>, ActivityHubError> {
        let Some(name) = data.name.filter(|name| !name.trim().is_empty()) else {
            tracing::debug!("add_name ignored, no name given");
            return Ok(Vec::new());
        };

        let mut changed = Vec::new();
        for id in self.resolve(data.entity_id).await {
            changed.extend(self.activities.add_name(id, name.clone()).await?);
        }
        Ok(changed)
    }

    async fn remove_name(&self, data: RemoveNameData) -> Result<Vec<Activity>, ActivityHubError> {
        let Some(index) = data.index.and_then(|index| usize::try_from(index).ok()) else {
            tracing::debug!(index = ?data.index, "remove_name ignored, no usable index");
            return Ok(Vec::new());
        };

        let mut changed = Vec::new();
        for id in self.resolve(data.entity_id).await {
            changed.extend(self.activities.remove_name(id, index).await?);
        }
        Ok(changed)
    }

    async fn resolve(&self, target: Option<EntityTarget>) -> Vec<ActivityId> {
        let mut ids = Vec::new();
        for entity_id in target.map(EntityTarget::into_vec).unwrap_or_default() {
            match self.activities.resolve_entity(&entity_id).await {
                Some(id) => ids.push(id),
                None => tracing::debug!(%entity_id, "unknown entity, skipped"),
            }
        }
        ids
    }
}

fn parse<T: DeserializeOwned>(
    service: &'static str,
    data: serde_json::Value,
) -> Result<T, ValidationError> {
    let data = if data.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|err| ValidationError::InvalidPayload {
        service,
        reason: err.to_string(),
    })
}

fn unknown_service(domain: &str, service: &str) -> ActivityHubError {
    NotFoundError {
        entity: "Service",
        id: format!("{domain}.{service}"),
    }
    .into()
}
