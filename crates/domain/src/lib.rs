//! # activityhub-domain
//!
//! Pure domain model for the activityhub chore tracker.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Activities** (recurring tasks with rotating display names)
//! - Define **Frequencies** (recurrence intervals)
//! - Define **Sensor entities** (the read-only projection of an activity)
//! - Define **Events** (change notifications)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod activity;
pub mod event;
pub mod frequency;
pub mod sensor;
