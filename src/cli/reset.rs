//! CLI `reset` command: clear stored collections after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use pantry::catalog::dependents_of;
use pantry::config::PantryConfig;
use pantry::{Store, COLLECTION_KEYS};

/// Clear one collection, or every collection, after user confirmation.
pub async fn reset(store: &Store, config: &PantryConfig, collection: Option<&str>) -> Result<()> {
    if let Some(key) = collection {
        if !COLLECTION_KEYS.contains(&key) {
            bail!("unknown collection: {key}");
        }
        println!("WARNING: This will permanently delete the {key} collection.");
        let dependents = dependents_of(key);
        if !dependents.is_empty() {
            println!("Also deleted with it: {}", dependents.join(", "));
        }
    } else {
        println!("WARNING: This will permanently delete ALL stored collections.");
    }
    println!("Deleted collections are reseeded with sample data on next access.");
    if config.storage.backend == "sqlite" {
        println!("Database: {}", config.resolved_db_path().display());
    }
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    match collection {
        Some(key) => {
            store.reset_collection(key).await?;
            println!("Collection {key} deleted.");
        }
        None => {
            store.reset().await?;
            println!("All collections deleted. Store reset complete.");
        }
    }
    Ok(())
}
