//! JSON file implementation of [`ActivityStore`].

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use activityhub_app::ports::ActivityStore;
use activityhub_domain::activity::Activity;
use activityhub_domain::error::ActivityHubError;

use crate::error::StorageError;

/// File name used when only a storage directory is configured.
pub const DEFAULT_FILE_NAME: &str = ".activities_list.json";

/// Activity store keeping the whole list as one JSON array.
///
/// Records that fail to load are kept aside as raw JSON and appended after
/// the readable activities on every save, so nothing in the file is lost.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    unreadable: Arc<Mutex<Vec<Value>>>,
}

impl JsonFileStore {
    /// Store reading and writing `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unreadable: Arc::default(),
        }
    }

    /// Store writing [`DEFAULT_FILE_NAME`] inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StorageError {
        StorageError::Json {
            path: self.path.clone(),
            source,
        }
    }

    async fn read(&self) -> Result<Vec<Activity>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no activity file yet");
                self.unreadable.lock().await.clear();
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            self.unreadable.lock().await.clear();
            return Ok(Vec::new());
        }

        let records: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(|err| self.json_error(err))?;

        let mut activities = Vec::with_capacity(records.len());
        let mut unreadable = Vec::new();
        for (position, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Activity>(record.clone()) {
                Ok(activity) => activities.push(activity),
                Err(err) => {
                    tracing::warn!(%err, position, path = %self.path.display(), "keeping unreadable activity record aside");
                    unreadable.push(record);
                }
            }
        }
        *self.unreadable.lock().await = unreadable;
        Ok(activities)
    }

    async fn write(&self, activities: &[Activity]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }

        let unreadable = self.unreadable.lock().await;
        let mut records = activities
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| self.json_error(err))?;
        records.extend(unreadable.iter().cloned());

        let bytes = serde_json::to_vec_pretty(&records).map_err(|err| self.json_error(err))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|err| self.io_error(err))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| self.io_error(err))?;

        drop(unreadable);
        tracing::debug!(count = activities.len(), path = %self.path.display(), "activities saved");
        Ok(())
    }
}

impl ActivityStore for JsonFileStore {
    fn load(&self) -> impl Future<Output = Result<Vec<Activity>, ActivityHubError>> + Send {
        async move { Ok(self.read().await?) }
    }

    fn save(
        &self,
        activities: Vec<Activity>,
    ) -> impl Future<Output = Result<(), ActivityHubError>> + Send {
        async move { Ok(self.write(&activities).await?) }
    }
}
