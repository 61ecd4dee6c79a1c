//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use pantry::config::PantryConfig;
use pantry::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &PantryConfig) -> Result<()> {
    if config.storage.backend != "sqlite" {
        println!("Backend:           {} (nothing on disk to check)", config.storage.backend);
        return Ok(());
    }

    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `pantry seed` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Pantry Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", super::format_bytes(file_size));
    println!(
        "Schema version:    {} (current {})",
        report.schema_version,
        db::migrations::CURRENT_SCHEMA_VERSION
    );
    println!();
    println!("Collections:       {}", report.collection_count);
    println!("Blob bytes:        {}", super::format_bytes(report.total_blob_bytes));
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.pantry/store.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     pantry export > backup.json");
        println!("     pantry reset && pantry import backup.json");
    }

    Ok(())
}
