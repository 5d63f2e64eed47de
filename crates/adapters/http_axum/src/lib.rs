//! # activityhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **REST-ish JSON API** for programmatic access
//!   (`/api/activities`, `/api/states`, `/api/services/{domain}/{service}`, …)
//! - Serve the **WebSocket command API** at `/api/websocket`
//!   (`activity_manager/items`, `activity_manager/add`, … plus event subscriptions)
//! - Map HTTP requests and socket commands into application service calls (driving adapter)
//! - Map application results into JSON responses and result frames
//!
//! ## Dependency rule
//! Depends on `activityhub-app` (for port traits and services) and `activityhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
