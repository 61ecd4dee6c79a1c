use anyhow::Result;

use pantry::config::PantryConfig;
use pantry::persistence::sqlite::blob_info;
use pantry::COLLECTION_KEYS;

/// Display per-collection record counts, blob sizes and last writes.
pub fn stats(config: &PantryConfig) -> Result<()> {
    if config.storage.backend != "sqlite" {
        println!("The {} backend keeps nothing between runs.", config.storage.backend);
        return Ok(());
    }

    let db_path = config.resolved_db_path();
    let conn = pantry::db::open_database(&db_path)?;
    let blobs = blob_info(&conn)?;

    println!("Store Statistics");
    println!("{}", "=".repeat(64));
    println!(
        "  {:<26} {:>8} {:>10}  {}",
        "Collection", "Records", "Size", "Last write"
    );

    let mut total_bytes = 0;
    for key in COLLECTION_KEYS {
        let Some(info) = blobs.iter().find(|b| b.key == *key) else {
            println!("  {:<26} {:>8} {:>10}  {}", key, "-", "-", "(not seeded)");
            continue;
        };
        total_bytes += info.bytes;
        let records = conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .ok()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .map(|value| match value {
                serde_json::Value::Array(items) => items.len().to_string(),
                serde_json::Value::Null => "0".to_string(),
                _ => "1".to_string(),
            })
            .unwrap_or_else(|| "corrupt".to_string());
        println!(
            "  {:<26} {:>8} {:>10}  {}",
            key,
            records,
            super::format_bytes(info.bytes),
            info.updated_at.as_deref().unwrap_or("-")
        );
    }

    for info in blobs.iter().filter(|b| !COLLECTION_KEYS.contains(&b.key.as_str())) {
        println!("  {:<26} {:>8} {:>10}  (unknown key)", info.key, "?", super::format_bytes(info.bytes));
    }

    println!();
    println!("Database:          {}", db_path.display());
    println!("Stored blobs:      {} bytes", total_bytes);
    Ok(())
}
