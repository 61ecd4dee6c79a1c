//! Concrete collections: schema, canonical order, normalization, and sample
//! data for each entity, plus the entity-specific store operations.

/// Declare a closed string enum with `as_str`, `ALL`, `Display`, `FromStr`, and
/// serde support using the same spelling.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

pub mod analytics;
pub mod apis;
pub mod chats;
pub mod emails;
pub mod events;
pub mod feedbacks;
pub mod monitoring;
pub mod notifications;
pub mod payments;
pub mod subscriptions;
pub mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::store::{ListParams, Record, Store};

pub use analytics::{AnalyticsDaily, AnalyticsKpis, SourceDaily};
pub use apis::{Api, ApiKey};
pub use chats::{ChatMessage, ChatThread};
pub use emails::Email;
pub use events::CalendarEvent;
pub use feedbacks::Feedback;
pub use monitoring::{InternalApiLog, InternalApiMetric, MonitoringMetric};
pub use notifications::Notification;
pub use payments::Payment;
pub use subscriptions::Subscription;
pub use users::User;

/// Every persisted collection key, parents before children and sources before
/// derived collections.
pub const COLLECTION_KEYS: &[&str] = &[
    "users",
    "notifications",
    "emails",
    "feedbacks",
    "payments",
    "subscriptions",
    "apis",
    "api_keys",
    "chats",
    "chat_messages",
    "events",
    "analytics_daily",
    "analytics_sources_daily",
    "analytics_kpis",
    "monitoring_metrics",
    "internal_api_metrics",
    "internal_api_logs",
];

const fn parent_of(parent: Option<&'static str>) -> &'static str {
    match parent {
        Some(key) => key,
        None => panic!("collection has no parent"),
    }
}

/// `(source, dependent)` pairs: child collections keyed by their parent, and
/// derived collections keyed by the series they are computed from. A dependent
/// must be dropped whenever its source is replaced.
const DEPENDENTS: &[(&str, &str)] = &[
    (parent_of(ApiKey::PARENT_KEY), ApiKey::KEY),
    (parent_of(ChatMessage::PARENT_KEY), ChatMessage::KEY),
    (AnalyticsDaily::KEY, SourceDaily::KEY),
    (AnalyticsDaily::KEY, analytics::KPIS_KEY),
];

/// Every collection that has to go when `key` is replaced, transitively.
pub fn dependents_of(key: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();
    let mut pending = vec![key];
    while let Some(source) = pending.pop() {
        for &(from, to) in DEPENDENTS {
            if from == source && !found.contains(&to) {
                found.push(to);
                pending.push(to);
            }
        }
    }
    found
}

fn known_key(key: &str) -> Result<&'static str> {
    COLLECTION_KEYS
        .iter()
        .copied()
        .find(|k| *k == key)
        .ok_or_else(|| StoreError::validation("collection", format!("unknown collection: {key}")))
}

/// Make sure `value` decodes as the stored form of collection `key`.
fn check_blob(key: &'static str, value: &Value) -> Result<()> {
    fn decodes<T: DeserializeOwned>(key: &'static str, value: &Value) -> Result<()> {
        T::deserialize(value)
            .map(drop)
            .map_err(|e| StoreError::validation("collections", format!("{key}: {e}")))
    }

    match key {
        "users" => decodes::<Vec<User>>(key, value),
        "notifications" => decodes::<Vec<Notification>>(key, value),
        "emails" => decodes::<Vec<Email>>(key, value),
        "feedbacks" => decodes::<Vec<Feedback>>(key, value),
        "payments" => decodes::<Vec<Payment>>(key, value),
        "subscriptions" => decodes::<Vec<Subscription>>(key, value),
        "apis" => decodes::<Vec<Api>>(key, value),
        "api_keys" => decodes::<Vec<ApiKey>>(key, value),
        "chats" => decodes::<Vec<ChatThread>>(key, value),
        "chat_messages" => decodes::<Vec<ChatMessage>>(key, value),
        "events" => decodes::<Vec<CalendarEvent>>(key, value),
        "analytics_daily" => decodes::<Vec<AnalyticsDaily>>(key, value),
        "analytics_sources_daily" => decodes::<Vec<SourceDaily>>(key, value),
        "analytics_kpis" => decodes::<Option<AnalyticsKpis>>(key, value),
        "monitoring_metrics" => decodes::<Vec<MonitoringMetric>>(key, value),
        "internal_api_metrics" => decodes::<Vec<InternalApiMetric>>(key, value),
        "internal_api_logs" => decodes::<Vec<InternalApiLog>>(key, value),
        other => Err(StoreError::validation(
            "collection",
            format!("unknown collection: {other}"),
        )),
    }
}

/// What [`Store::import_blobs`] did with each key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: Vec<&'static str>,
    /// Unknown keys, and keys already holding data when not overwriting.
    pub skipped: Vec<String>,
    /// Dependents dropped because their source was replaced.
    pub cleared: Vec<&'static str>,
}

/// Record count of one collection after seeding.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub collection: &'static str,
    pub records: usize,
}

impl Store {
    /// Make sure every collection has been seeded, in dependency order.
    pub async fn seed_all(&self) -> Result<Vec<SeedSummary>> {
        let mut summary = Vec::with_capacity(COLLECTION_KEYS.len());
        for key in COLLECTION_KEYS {
            let records = match *key {
                "analytics_kpis" => usize::from(self.analytics_kpis().await?.is_some()),
                "analytics_sources_daily" => self.analytics_sources_snapshot().await?.len(),
                _ => self.list_json(key, &ListParams::default()).await?.total,
            };
            summary.push(SeedSummary {
                collection: *key,
                records,
            });
        }
        Ok(summary)
    }

    /// Drop one collection and everything derived from or owned by it. They
    /// reseed on next access.
    pub async fn reset_collection(&self, key: &str) -> Result<()> {
        let key = known_key(key)?;
        let dependents = dependents_of(key);
        // children first, so a failure never leaves them pointing at a fresh parent
        for dependent in &dependents {
            self.blobs().remove(dependent).await?;
        }
        self.blobs().remove(key).await?;
        tracing::info!(collection = key, ?dependents, "collection reset");
        Ok(())
    }

    /// Store exported collection blobs as-is.
    ///
    /// Every accepted value must decode as its collection's stored form; one
    /// bad value rejects the whole import before anything is written. Keys that
    /// already hold data are skipped unless `overwrite` is set, unknown keys
    /// are skipped, and dependents of a replaced collection that the import
    /// does not itself supply are dropped so they reseed against the new data.
    pub async fn import_blobs(
        &self,
        collections: BTreeMap<String, Value>,
        overwrite: bool,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut accepted: Vec<(&'static str, Value)> = Vec::new();

        for (key, value) in collections {
            let Ok(known) = known_key(&key) else {
                tracing::warn!(collection = %key, "ignoring unknown collection");
                summary.skipped.push(key);
                continue;
            };
            if !overwrite && self.blobs().load_raw(known).await.is_some() {
                tracing::debug!(collection = known, "already present, skipped");
                summary.skipped.push(key);
                continue;
            }
            check_blob(known, &value)?;
            accepted.push((known, value));
        }

        for (key, value) in &accepted {
            self.blobs().save_raw(key, value.to_string()).await?;
            summary.imported.push(*key);
        }

        for (key, _) in &accepted {
            for dependent in dependents_of(key) {
                let supplied = accepted.iter().any(|(k, _)| *k == dependent);
                if !supplied && !summary.cleared.contains(&dependent) {
                    self.blobs().remove(dependent).await?;
                    summary.cleared.push(dependent);
                }
            }
        }

        tracing::info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            cleared = summary.cleared.len(),
            "import complete"
        );
        Ok(summary)
    }

    /// List any collection by key, returning the page as JSON. Used by the CLI.
    ///
    /// Key secrets are masked; the full secret is only on the typed records.
    pub async fn list_json(&self, key: &str, params: &ListParams) -> Result<JsonPage> {
        match key {
            "users" => json_page(self.users().list(params).await?),
            "notifications" => json_page(self.notifications().list(params).await?),
            "emails" => json_page(self.emails().list(params).await?),
            "feedbacks" => json_page(self.feedbacks().list(params).await?),
            "payments" => json_page(self.payments().list(params).await?),
            "subscriptions" => json_page(self.subscriptions().list(params).await?),
            "apis" => json_page(self.apis().list(params).await?),
            "api_keys" => {
                let mut page = self.api_keys().await?.list(params).await?;
                for api_key in &mut page.items {
                    api_key.secret = api_key.masked_secret();
                }
                json_page(page)
            }
            "chats" => json_page(self.chats().list(params).await?),
            "chat_messages" => json_page(self.chat_messages().await?.list(params).await?),
            "events" => json_page(self.events().list(params).await?),
            "analytics_daily" => json_page(self.analytics_daily().list(params).await?),
            "analytics_sources_daily" => json_page(self.analytics_sources(params).await?),
            "monitoring_metrics" => json_page(self.monitoring_metrics().list(params).await?),
            "internal_api_metrics" => json_page(self.internal_api_metrics().list(params).await?),
            "internal_api_logs" => json_page(self.internal_api_logs().list(params).await?),
            other => Err(StoreError::validation(
                "collection",
                format!("unknown or non-listable collection: {other}"),
            )),
        }
    }
}

/// A page whose items have been converted to JSON values.
pub type JsonPage = crate::store::Page<serde_json::Value>;

fn json_page<T: Record>(page: crate::store::Page<T>) -> Result<JsonPage> {
    let items = page
        .items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Storage(e.into()))?;
    Ok(crate::store::Page {
        items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_and_sources_name_their_dependents() {
        assert_eq!(dependents_of("apis"), vec!["api_keys"]);
        assert_eq!(dependents_of("chats"), vec!["chat_messages"]);
        assert_eq!(
            dependents_of("analytics_daily"),
            vec!["analytics_sources_daily", "analytics_kpis"]
        );
        assert!(dependents_of("users").is_empty());
        assert!(dependents_of("api_keys").is_empty());
    }

    #[test]
    fn every_dependency_is_a_known_collection() {
        for (from, to) in DEPENDENTS {
            assert!(COLLECTION_KEYS.contains(from), "{from}");
            assert!(COLLECTION_KEYS.contains(to), "{to}");
        }
    }

    #[test]
    fn mistyped_blob_is_rejected() {
        let err = check_blob("users", &serde_json::json!([{ "id": 1 }])).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("users"));

        check_blob("users", &serde_json::json!([])).unwrap();
        check_blob("analytics_kpis", &Value::Null).unwrap();
    }
}
