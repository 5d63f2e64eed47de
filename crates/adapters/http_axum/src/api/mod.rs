//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod activities;
#[allow(clippy::missing_errors_doc)]
pub mod services;
#[allow(clippy::missing_errors_doc)]
pub mod states;
pub mod ws;
pub mod ws_messages;

use axum::Router;
use axum::routing::{get, post};

use activityhub_app::ports::{ActivityStore, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, P>() -> Router<AppState<S, P>>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Activities
        .route("/activities", get(activities::list::<S, P>))
        .route("/activities/{id}", get(activities::get::<S, P>))
        // Sensor states
        .route("/states", get(states::list::<S, P>))
        .route("/states/{entity_id}", get(states::get::<S, P>))
        // Services
        .route("/services", get(services::list))
        .route(
            "/services/{domain}/{service}",
            post(services::call::<S, P>),
        )
        // Socket API
        .route("/websocket", get(ws::upgrade::<S, P>))
}
