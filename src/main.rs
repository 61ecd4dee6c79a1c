mod cli;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pantry::config::PantryConfig;
use pantry::Store;

#[derive(Parser)]
#[command(name = "pantry", version, about = "Embedded entity store with seeded sample data")]
struct Cli {
    /// Config file (defaults to ~/.pantry/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed every collection and print record counts
    Seed,
    /// Print one page of a collection as JSON
    List {
        collection: String,
        /// Free-text search
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show per-collection counts and sizes
    Stats,
    /// Export all collections as JSON to stdout
    Export,
    /// Import collections from an export file
    Import {
        file: PathBuf,
        /// Replace collections that already hold data
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete one collection, or all of them (asks for confirmation)
    Reset {
        /// Only this collection
        collection: Option<String>,
    },
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PantryConfig::load_from(path)?,
        None => PantryConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON output.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Seed => cli::seed(&Store::open(&config)?).await?,
        Command::List {
            collection,
            q,
            status,
            from,
            to,
            sort_by,
            desc,
            page,
            page_size,
        } => {
            let args = cli::list::ListArgs {
                q,
                status,
                from,
                to,
                sort_by,
                desc,
                page,
                page_size: config.page_size(page_size),
            };
            cli::list::list(&Store::open(&config)?, &collection, args).await?;
        }
        Command::Stats => cli::stats::stats(&config)?,
        Command::Export => cli::export::export(&Store::open(&config)?).await?,
        Command::Import { file, overwrite } => {
            cli::import::import(&Store::open(&config)?, &file, overwrite).await?;
        }
        Command::Reset { collection } => {
            cli::reset::reset(&Store::open(&config)?, &config, collection.as_deref()).await?;
        }
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
