use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use pantry::Store;

/// Export format: every stored blob, keyed by collection.
#[derive(Debug, Serialize)]
struct ExportData {
    exported_at: DateTime<Utc>,
    collections: BTreeMap<String, serde_json::Value>,
}

/// Export all stored collections as JSON to stdout.
pub async fn export(store: &Store) -> Result<()> {
    let mut collections = BTreeMap::new();
    for key in store.blobs().keys().await? {
        let Some(raw) = store.blobs().load_raw(&key).await else {
            continue;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                collections.insert(key, value);
            }
            Err(e) => tracing::warn!(collection = %key, error = %e, "skipping malformed blob"),
        }
    }

    let data = ExportData {
        exported_at: store.now(),
        collections,
    };

    let json = serde_json::to_string_pretty(&data).context("failed to encode export")?;
    println!("{json}");

    eprintln!("Exported {} collections.", data.collections.len());
    Ok(())
}
