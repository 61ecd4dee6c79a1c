//! Schema traits implemented by every entity in the catalog.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;

use super::query::SortDir;
use super::seed::SeedContext;
use crate::error::Result;

/// A value a record can be ordered by.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Compared lexicographically. Build with [`SortKey::text`] to fold case.
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortKey {
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A stored entity type: its collection key, canonical order, and the fields the
/// query engine looks at.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Persistence key of the collection.
    const KEY: &'static str;

    /// Canonical order, used when the caller gives no sort and whenever the
    /// collection is persisted.
    const DEFAULT_SORT: (&'static str, SortDir);

    /// Whether an update refreshes the record's activity timestamp (see
    /// [`Record::touch`]) and thereby moves it in the canonical order.
    const REORDERS_ON_UPDATE: bool = false;

    /// Key of the owning collection for child records.
    const PARENT_KEY: Option<&'static str> = None;

    fn id(&self) -> &str;

    /// Fields matched by free-text search.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Value compared by the status filter.
    fn status(&self) -> Option<&str> {
        None
    }

    /// Timestamp compared by the date-range filter.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn sort_key(&self, field: &str) -> Option<SortKey>;

    /// Id of the owning record, for collections with a [`Record::PARENT_KEY`].
    fn parent_id(&self) -> Option<&str> {
        None
    }

    /// Refresh the activity timestamp. Only called when
    /// [`Record::REORDERS_ON_UPDATE`] is set.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Sample records for a collection seen for the first time.
    fn seed(_ctx: &mut SeedContext<'_>) -> Vec<Self> {
        Vec::new()
    }
}

/// Records that callers can create and partially update.
pub trait Editable: Record {
    /// Create payload. Optional fields fall back to schema defaults.
    type Draft: Send;
    /// Partial changes; `None` fields are left untouched.
    type Patch: Clone + Send + Sync;

    /// Build a normalized, validated record from a draft.
    fn build(id: String, now: DateTime<Utc>, draft: Self::Draft) -> Result<Self>;

    /// Merge `patch` into `self`, re-normalizing and re-validating.
    fn apply(&mut self, patch: &Self::Patch) -> Result<()>;
}

/// Records with a two-valued status that can be flipped.
pub trait Toggle: Record {
    fn toggle(&mut self);
}

/// Round a money amount to cents.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round a percentage to two decimals and clamp it into `[0, 100]`.
pub fn round_percent(value: f64) -> f64 {
    round_money(value.clamp(0.0, 100.0))
}

/// Round to the nearest integer and clamp into `[1, 5]`.
pub fn clamp_rating(value: f64) -> u8 {
    if value.is_nan() {
        return 1;
    }
    value.round().clamp(1.0, 5.0) as u8
}
