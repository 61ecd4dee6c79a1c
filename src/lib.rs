//! Embedded entity store with seeded sample collections.
//!
//! Pantry keeps a dozen or so independent collections (users, notifications,
//! emails, payments, subscriptions, APIs and their keys, chat threads and
//! messages, calendar events, analytics and monitoring series). Each collection
//! is persisted as one JSON blob and exposed through the same small contract:
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | `list` | free-text search, status and date filters, stable sort, pagination |
//! | `create` / `update` | defaults filled, normalized, validated |
//! | `delete` / bulk variants | absent ids are not an error |
//! | entity extras | key rotation, cascade delete, chat messages, derived analytics |
//!
//! A collection is seeded with deterministic sample data the first time its key
//! is read and is never reseeded while the key exists.
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`persistence`]: blob backends (SQLite, in-memory) and the async blob store
//! - [`store`]: the [`Store`], typed collections, query engine, and seeding
//! - [`catalog`]: every entity schema and its entity-specific operations
//! - [`error`]: the [`StoreError`] taxonomy

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod persistence;
pub mod store;

pub use catalog::{ImportSummary, SeedSummary, COLLECTION_KEYS};
pub use error::{Result, StoreError};
pub use store::{
    Clock, Collection, Editable, ListParams, ManualClock, Page, Record, Seeding, SortDir, Store,
    SystemClock, Toggle,
};
