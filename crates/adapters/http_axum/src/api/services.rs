//! JSON REST handlers for named services.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};

use activityhub_app::ports::{ActivityStore, EventPublisher};
use activityhub_app::services::service_dispatcher::{self, ServiceDescription};
use activityhub_domain::error::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/services`
pub async fn list() -> Json<&'static [ServiceDescription]> {
    Json(service_dispatcher::descriptions())
}

/// `POST /api/services/{domain}/{service}`
///
/// The body is the service data; an empty body means no data. Answers
/// with an empty JSON array once the call has been handled, including
/// calls that matched nothing.
pub async fn call<S, P>(
    State(state): State<AppState<S, P>>,
    Path((domain, service)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Vec<serde_json::Value>>, ApiError>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let data = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|err| ValidationError::InvalidPayload {
            service: "service call",
            reason: err.to_string(),
        })?
    };

    let changed = state.dispatcher.call(&domain, &service, data).await?;
    tracing::debug!(%domain, %service, changed = changed.len(), "service called");
    Ok(Json(Vec::new()))
}
