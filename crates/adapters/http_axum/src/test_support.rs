//! In-memory port fakes shared by handler tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use activityhub_app::event_bus::InProcessEventBus;
use activityhub_app::ports::ActivityStore;
use activityhub_app::services::activity_service::ActivityService;
use activityhub_domain::activity::Activity;
use activityhub_domain::error::ActivityHubError;

use crate::state::AppState;

#[derive(Default)]
pub struct InMemoryStore {
    saved: Mutex<Vec<Activity>>,
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
        *self.saved.lock().unwrap() = activities;
        async { Ok(()) }
    }
}

pub type TestState = AppState<InMemoryStore, Arc<InProcessEventBus>>;

pub fn test_state() -> TestState {
    let event_bus = Arc::new(InProcessEventBus::new(16));
    let service = ActivityService::new(InMemoryStore::default(), Arc::clone(&event_bus));
    AppState::new(Arc::new(service), event_bus)
}
