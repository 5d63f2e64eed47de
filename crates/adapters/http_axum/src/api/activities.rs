//! JSON REST handlers for activity records.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use activityhub_app::ports::{ActivityStore, EventPublisher};
use activityhub_domain::activity::Activity;
use activityhub_domain::error::{NotFoundError, ValidationError};
use activityhub_domain::id::ActivityId;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// `GET /api/activities`
pub async fn list<S, P>(
    State(state): State<AppState<S, P>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Activity>>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(
        state
            .activity_service
            .items(query.category.as_deref())
            .await,
    )
}

/// `GET /api/activities/{id}`
pub async fn get<S, P>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<String>,
) -> Result<Json<Activity>, ApiError>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let activity_id =
        ActivityId::from_str(&id).map_err(|_| ValidationError::InvalidId { value: id.clone() })?;
    let activity = state
        .activity_service
        .get(activity_id)
        .await
        .ok_or(NotFoundError {
            entity: "Activity",
            id,
        })?;
    Ok(Json(activity))
}
