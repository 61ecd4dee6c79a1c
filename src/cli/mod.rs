pub mod doctor;
pub mod export;
pub mod import;
pub mod list;
pub mod reset;
pub mod stats;

use anyhow::Result;

use pantry::Store;

/// Seed every collection in dependency order and print the resulting counts.
pub async fn seed(store: &Store) -> Result<()> {
    let summary = store.seed_all().await?;

    println!("{:<26} {:>8}", "Collection", "Records");
    println!("{}", "-".repeat(35));
    for entry in &summary {
        println!("{:<26} {:>8}", entry.collection, entry.records);
    }
    Ok(())
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
