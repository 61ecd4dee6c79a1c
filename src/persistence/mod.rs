//! Blob persistence for collections.
//!
//! Every collection is stored as one serialized JSON blob under a stable key.
//! [`Backend`] is the raw key/value seam; [`BlobStore`] layers typed
//! load/save on top of it and moves blocking backend calls off the async
//! executor.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::Clock;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Raw key/value storage for collection blobs.
///
/// Implementations are synchronous; [`BlobStore`] calls them through
/// `tokio::task::spawn_blocking`.
pub trait Backend: Send + Sync {
    /// Read the blob stored under `key`, or `None` if the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`, recording `written_at` as its
    /// last write time where the backend keeps one.
    fn write(&self, key: &str, blob: &str, written_at: DateTime<Utc>) -> Result<()>;

    /// Remove a single key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently holding a blob, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key.
    fn clear(&self) -> Result<()>;
}

/// Typed access to a [`Backend`]. Cheap to clone.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
}

impl BlobStore {
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Load the blob under `key`, returning the empty value for `T` when the key
    /// is missing or its contents cannot be decoded.
    pub async fn load<T>(&self, key: &'static str) -> T
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        self.try_load(key).await.unwrap_or_default()
    }

    /// Like [`load`](Self::load) but distinguishes "never written or unreadable"
    /// (`None`) from a stored value.
    pub async fn try_load<T>(&self, key: &'static str) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let raw = self.load_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(collection = key, error = %e, "stored blob is malformed, treating as empty");
                None
            }
        }
    }

    /// Raw blob text under `key`. Backend read failures are logged and
    /// reported as a missing key.
    pub async fn load_raw(&self, key: &str) -> Option<String> {
        let backend = Arc::clone(&self.backend);
        let owned = key.to_string();
        let joined = tokio::task::spawn_blocking(move || backend.read(&owned)).await;
        match joined {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(collection = key, error = %e, "backend read failed, treating as empty");
                None
            }
            Err(e) => {
                tracing::warn!(collection = key, error = %e, "backend read task failed, treating as empty");
                None
            }
        }
    }

    /// Serialize `value` and replace the whole blob under `key`.
    pub async fn save<T>(&self, key: &'static str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let blob = serde_json::to_string(value).map_err(|e| StoreError::Storage(e.into()))?;
        self.save_raw(key, blob).await
    }

    /// Replace the blob under `key` with already-serialized text.
    pub async fn save_raw(&self, key: &str, blob: String) -> Result<(), StoreError> {
        let backend = Arc::clone(&self.backend);
        let owned = key.to_string();
        let written_at = self.clock.now();
        tokio::task::spawn_blocking(move || backend.write(&owned, &blob, written_at))
            .await
            .map_err(|e| StoreError::Storage(e.into()))?
            .map_err(StoreError::Storage)
    }

    /// Remove the blob under `key` so the collection seeds again on next access.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let backend = Arc::clone(&self.backend);
        let owned = key.to_string();
        tokio::task::spawn_blocking(move || backend.remove(&owned))
            .await
            .map_err(|e| StoreError::Storage(e.into()))?
            .map_err(StoreError::Storage)
    }

    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.keys())
            .await
            .map_err(|e| StoreError::Storage(e.into()))?
            .map_err(StoreError::Storage)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.clear())
            .await
            .map_err(|e| StoreError::Storage(e.into()))?
            .map_err(StoreError::Storage)
    }
}
