//! # activityhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ActivityStore` — load and save the whole activity list
//!   - `EventPublisher` — broadcast change events
//! - Define **driving/inbound** use-cases:
//!   - `ActivityService` — the activity list manager (add, remove, update, names)
//!   - `ServiceDispatcher` — named `activity_manager.*` service calls
//! - Keep the **entity registry** mapping sensor entity ids to activities
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `activityhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod entity_registry;
pub mod event_bus;
pub mod ports;
pub mod services;
