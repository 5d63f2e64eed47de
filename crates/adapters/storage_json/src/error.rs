//! Storage-specific error type wrapping IO and JSON errors.

use std::path::PathBuf;

use activityhub_domain::error::ActivityHubError;

/// Errors originating from the JSON file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or renaming the file failed.
    #[error("IO error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not hold a valid activity list.
    #[error("JSON error in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StorageError> for ActivityHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
