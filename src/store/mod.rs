//! The store object and its generic building blocks.
//!
//! [`Store`] owns a persistence backend, a clock, and the seeding settings, and
//! hands out typed [`Collection`] handles. Entity-specific operations (cascade
//! delete, key rotation, chat messages, derived analytics) live next to their
//! schemas in [`crate::catalog`].

pub mod clock;
pub mod collection;
pub mod query;
pub mod record;
pub mod seed;

use anyhow::Context;
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{Collection, Seeding};
pub use query::{ListParams, Page, SortDir};
pub use record::{Editable, Record, SortKey, Toggle};
pub use seed::SeedContext;

use crate::config::PantryConfig;
use crate::error::{Result, StoreError};
use crate::persistence::{Backend, BlobStore, MemoryBackend, SqliteBackend};

/// Handle to every collection. Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Store {
    blobs: BlobStore,
    clock: Arc<dyn Clock>,
    seeding: Seeding,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>, seeding: Seeding) -> Self {
        Self {
            blobs: BlobStore::new(backend, Arc::clone(&clock)),
            clock,
            seeding,
        }
    }

    /// Ephemeral store on the wall clock with default seeding.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
            Seeding::default(),
        )
    }

    /// Build the store described by `config`.
    pub fn open(config: &PantryConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = match config.storage.backend.as_str() {
            "sqlite" => {
                let path = config.resolved_db_path();
                let backend = SqliteBackend::open(&path)
                    .with_context(|| format!("failed to open store at {}", path.display()))
                    .map_err(StoreError::Storage)?;
                Arc::new(backend)
            }
            "memory" => Arc::new(MemoryBackend::new()),
            other => {
                return Err(StoreError::Config(format!(
                    "unknown storage backend: {other}. Supported: sqlite, memory"
                )))
            }
        };

        let seeding = Seeding {
            enabled: config.seeding.enabled,
            seed: config.seeding.seed,
        };
        tracing::info!(backend = %config.storage.backend, seed = seeding.seed, "store ready");
        Ok(Self::new(backend, Arc::new(SystemClock), seeding))
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Typed handle for any catalog entity.
    pub fn collection<T: Record>(&self) -> Collection<T> {
        Collection::new(self.blobs.clone(), Arc::clone(&self.clock), self.seeding)
    }

    /// Remove every stored blob. Collections reseed on next access.
    pub async fn reset(&self) -> Result<()> {
        self.blobs.clear().await?;
        tracing::info!("store reset");
        Ok(())
    }
}
