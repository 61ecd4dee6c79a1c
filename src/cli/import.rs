use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use pantry::Store;

/// Import format, matches export output.
#[derive(Debug, Deserialize)]
struct ImportData {
    collections: BTreeMap<String, serde_json::Value>,
}

/// Write the collections in `file` back into the store.
///
/// Keys that already hold data are skipped unless `overwrite` is set. Unknown
/// keys are ignored. A value that does not decode as its collection aborts
/// the import before anything is written.
pub async fn import(store: &Store, file: &Path, overwrite: bool) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: ImportData = serde_json::from_str(&json).context("failed to parse import JSON")?;

    println!("Importing {} collections...", data.collections.len());

    let summary = store
        .import_blobs(data.collections, overwrite)
        .await
        .with_context(|| format!("rejected import file: {}", file.display()))?;

    for key in &summary.skipped {
        println!("  {key}: skipped");
    }
    for key in &summary.cleared {
        println!("  {key}: cleared, reseeds from imported data");
    }
    println!(
        "Import complete: {} imported, {} skipped.",
        summary.imported.len(),
        summary.skipped.len()
    );
    Ok(())
}
