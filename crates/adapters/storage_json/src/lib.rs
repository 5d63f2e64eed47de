//! # activityhub-adapter-storage-json
//!
//! JSON file persistence adapter.
//!
//! ## Responsibilities
//! - Implement the `ActivityStore` port trait defined in `activityhub-app::ports`
//! - Read and migrate the persisted activity list
//! - Carry records it cannot read through every save untouched
//! - Rewrite the file atomically (temp file + rename) on every save
//!
//! ## Dependency rule
//! Depends on `activityhub-app` (for port traits) and `activityhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod store;

pub use store::{DEFAULT_FILE_NAME, JsonFileStore};
