//! Generic per-entity collection handle.
//!
//! A [`Collection`] loads the whole collection blob, seeds it on first sight,
//! runs the query or mutation in memory, and writes the blob back once.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::Arc;

use super::clock::Clock;
use super::query::{self, ListParams, Page};
use super::record::{Editable, Record, Toggle};
use super::seed::SeedContext;
use crate::error::{Result, StoreError};
use crate::persistence::BlobStore;

/// Seeding switches shared by every collection of a store.
#[derive(Debug, Clone, Copy)]
pub struct Seeding {
    pub enabled: bool,
    pub seed: u64,
}

impl Default for Seeding {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 42,
        }
    }
}

/// Just the id of a parent record, read without knowing the parent's type.
#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

pub struct Collection<T> {
    blobs: BlobStore,
    clock: Arc<dyn Clock>,
    seeding: Seeding,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            blobs: self.blobs.clone(),
            clock: Arc::clone(&self.clock),
            seeding: self.seeding,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Collection<T> {
    pub(crate) fn new(blobs: BlobStore, clock: Arc<dyn Clock>, seeding: Seeding) -> Self {
        Self {
            blobs,
            clock,
            seeding,
            _record: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        T::KEY
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The full collection in canonical order, seeding it if the key has never
    /// been written (or holds an unreadable blob).
    ///
    /// Child collections are seeded against the ids currently stored in their
    /// parent collection.
    pub async fn snapshot(&self) -> Result<Vec<T>> {
        if let Some(items) = self.blobs.try_load::<Vec<T>>(T::KEY).await {
            return Ok(items);
        }

        let parent_ids: Vec<String> = match T::PARENT_KEY {
            Some(parent) => {
                let parents: Vec<IdOnly> = self.blobs.load(parent).await;
                parents.into_iter().map(|p| p.id).collect()
            }
            None => Vec::new(),
        };

        self.seed_with(&parent_ids, |ctx| T::seed(ctx)).await
    }

    /// Like [`snapshot`](Self::snapshot), but seeds with `seed` instead of
    /// [`Record::seed`]. Used by derived collections.
    pub(crate) async fn snapshot_or_seed_with(
        &self,
        seed: impl FnOnce(&mut SeedContext<'_>) -> Vec<T>,
    ) -> Result<Vec<T>> {
        match self.blobs.try_load::<Vec<T>>(T::KEY).await {
            Some(items) => Ok(items),
            None => self.seed_with(&[], seed).await,
        }
    }

    async fn seed_with(
        &self,
        parent_ids: &[String],
        seed: impl FnOnce(&mut SeedContext<'_>) -> Vec<T>,
    ) -> Result<Vec<T>> {
        if !self.seeding.enabled {
            return Ok(Vec::new());
        }

        let mut ctx = SeedContext::new(self.seeding.seed, T::KEY, self.now(), parent_ids);
        let items = seed(&mut ctx);
        // Nothing to seed yet (e.g. a child whose parent is empty): leave the
        // key unwritten so a later access can seed it.
        if items.is_empty() {
            tracing::debug!(collection = T::KEY, "seed produced no records, key left unwritten");
            return Ok(items);
        }
        let items = self.persist(items).await?;
        tracing::info!(collection = T::KEY, count = items.len(), "seeded collection");
        Ok(items)
    }

    /// Sort into canonical order and replace the stored blob.
    pub(crate) async fn persist(&self, mut items: Vec<T>) -> Result<Vec<T>> {
        let (field, dir) = T::DEFAULT_SORT;
        query::sort_records(&mut items, field, dir);
        self.blobs.save(T::KEY, &items).await?;
        Ok(items)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<T>> {
        let items = self.snapshot().await?;
        let page = query::run(items, params);
        tracing::debug!(
            collection = T::KEY,
            total = page.total,
            page = page.page,
            "listed collection"
        );
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<T> {
        self.snapshot()
            .await?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found(T::KEY, id))
    }

    /// Remove by id. Absent ids are not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = self.delete_where(|r| r.id() == id).await?;
        tracing::debug!(collection = T::KEY, id, removed, "deleted record");
        Ok(())
    }

    /// Remove every record whose id is in `ids`; returns how many were removed.
    pub async fn delete_bulk(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = self.delete_where(|r| ids.iter().any(|id| id == r.id())).await?;
        tracing::debug!(collection = T::KEY, requested = ids.len(), removed, "bulk delete");
        Ok(removed)
    }

    /// Remove every record matching `pred`, persisting only if something changed.
    pub(crate) async fn delete_where(&self, pred: impl Fn(&T) -> bool) -> Result<usize> {
        let mut items = self.snapshot().await?;
        let before = items.len();
        items.retain(|r| !pred(r));
        let removed = before - items.len();
        if removed > 0 {
            self.persist(items).await?;
        }
        Ok(removed)
    }

    /// Put a new record at the front and persist. Child records must point
    /// at a parent that exists.
    pub(crate) async fn insert(&self, record: T) -> Result<T> {
        if let (Some(parent), Some(parent_id)) = (T::PARENT_KEY, record.parent_id()) {
            let parents: Vec<IdOnly> = self.blobs.load(parent).await;
            if !parents.iter().any(|p| p.id == parent_id) {
                return Err(StoreError::not_found(parent, parent_id));
            }
        }

        let mut items = self.snapshot().await?;
        items.insert(0, record.clone());
        self.persist(items).await?;

        tracing::debug!(collection = T::KEY, id = record.id(), "created record");
        Ok(record)
    }

    /// Apply `change` to the record with `id`, touch it if the schema reorders
    /// on update, then persist.
    pub(crate) async fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut T) -> Result<()>,
    ) -> Result<T> {
        let mut items = self.snapshot().await?;
        let record = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found(T::KEY, id))?;

        change(record)?;
        if T::REORDERS_ON_UPDATE {
            record.touch(self.clock.now());
        }
        let updated = record.clone();

        self.persist(items).await?;
        Ok(updated)
    }
}

impl<T: Editable> Collection<T> {
    /// Build a record from `draft` with a fresh id and persist it. Fails with
    /// `NotFound` when a child record names a missing parent.
    pub async fn create(&self, draft: T::Draft) -> Result<T> {
        let id = uuid::Uuid::now_v7().to_string();
        let record = T::build(id, self.now(), draft)?;
        self.insert(record).await
    }

    /// Partially update one record. Fails with `NotFound` for unknown ids.
    pub async fn update(&self, id: &str, patch: &T::Patch) -> Result<T> {
        let updated = self.modify(id, |record| record.apply(patch)).await?;
        tracing::debug!(collection = T::KEY, id, "updated record");
        Ok(updated)
    }

    /// Apply `patch` to every record whose id is in `ids`. Unknown ids are
    /// ignored; a validation failure on any record aborts without writing.
    pub async fn update_bulk(&self, ids: &[String], patch: &T::Patch) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut items = self.snapshot().await?;
        let now = self.now();
        let mut updated = 0;
        for record in items.iter_mut().filter(|r| ids.iter().any(|id| id == r.id())) {
            record.apply(patch)?;
            if T::REORDERS_ON_UPDATE {
                record.touch(now);
            }
            updated += 1;
        }

        if updated > 0 {
            self.persist(items).await?;
        }
        tracing::debug!(collection = T::KEY, requested = ids.len(), updated, "bulk update");
        Ok(updated)
    }
}

impl<T: Toggle> Collection<T> {
    /// Flip the record's two-valued status.
    pub async fn toggle_status(&self, id: &str) -> Result<T> {
        self.modify(id, |record| {
            record.toggle();
            Ok(())
        })
        .await
    }
}
