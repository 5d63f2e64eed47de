//! Shared application state for axum handlers.

use std::sync::Arc;

use activityhub_app::event_bus::InProcessEventBus;
use activityhub_app::ports::{ActivityStore, EventPublisher};
use activityhub_app::services::activity_service::ActivityService;
use activityhub_app::services::service_dispatcher::ServiceDispatcher;

/// Application state shared across all axum handlers.
///
/// Generic over the activity store and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<S, P> {
    /// Activity list manager.
    pub activity_service: Arc<ActivityService<S, P>>,
    /// Named `activity_manager.*` services.
    pub dispatcher: ServiceDispatcher<S, P>,
    /// Event bus the socket API subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<S, P> Clone for AppState<S, P> {
    fn clone(&self) -> Self {
        Self {
            activity_service: Arc::clone(&self.activity_service),
            dispatcher: self.dispatcher.clone(),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<S, P> AppState<S, P>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create the state from a shared activity service and the bus its
    /// events are published on.
    pub fn new(
        activity_service: Arc<ActivityService<S, P>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            dispatcher: ServiceDispatcher::new(Arc::clone(&activity_service)),
            activity_service,
            event_bus,
        }
    }
}
