//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ActivityHubError`] via `#[from]` (or a manual `From` for boxed sources).

/// Base error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ActivityHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated by the caller's input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("an activity needs at least one name")]
    NoNames,

    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid identifier: {value}")]
    InvalidId { value: String },

    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: String },

    #[error("invalid frequency: {value}")]
    InvalidFrequency { value: String },

    #[error("invalid payload for {service}: {reason}")]
    InvalidPayload {
        service: &'static str,
        reason: String,
    },
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
