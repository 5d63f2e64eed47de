//! JSON REST handlers for sensor entities.

use axum::Json;
use axum::extract::{Path, State};

use activityhub_app::ports::{ActivityStore, EventPublisher};
use activityhub_domain::error::NotFoundError;
use activityhub_domain::sensor::SensorEntity;
use activityhub_domain::time::now;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/states`
pub async fn list<S, P>(State(state): State<AppState<S, P>>) -> Json<Vec<SensorEntity>>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(state.activity_service.sensors(now()).await)
}

/// `GET /api/states/{entity_id}`
pub async fn get<S, P>(
    State(state): State<AppState<S, P>>,
    Path(entity_id): Path<String>,
) -> Result<Json<SensorEntity>, ApiError>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let sensor = state
        .activity_service
        .sensor(&entity_id, now())
        .await
        .ok_or(NotFoundError {
            entity: "Entity",
            id: entity_id,
        })?;
    Ok(Json(sensor))
}
