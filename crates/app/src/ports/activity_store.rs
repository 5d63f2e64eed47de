//! Activity store port — whole-list persistence for activities.

use std::future::Future;

use activityhub_domain::activity::Activity;
use activityhub_domain::error::ActivityHubError;

/// Loads and saves the complete activity list.
///
/// The list is small and always rewritten as a whole, so there are no
/// per-record operations.
pub trait ActivityStore {
    /// Read every persisted activity, in stored order.
    ///
    /// A store that has never been written returns an empty list.
    fn load(&self) -> impl Future<Output = Result<Vec<Activity>, ActivityHubError>> + Send;

    /// Replace the persisted list with `activities`.
    fn save(
        &self,
        activities: Vec<Activity>,
    ) -> impl Future<Output = Result<(), ActivityHubError>> + Send;
}

impl<T: ActivityStore + Send + Sync> ActivityStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Vec<Activity>, ActivityHubError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        activities: Vec<Activity>,
    ) -> impl Future<Output = Result<(), ActivityHubError>> + Send {
        (**self).save(activities)
    }
}
