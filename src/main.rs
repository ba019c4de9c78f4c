//! `production-tracker` — interactive production order tracker.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use production_tracker::{run_session, ProductionStore, StoreConfig, DEFAULT_DB_PATH};

/// Track products, production orders and their status.
#[derive(Parser, Debug)]
#[command(name = "production-tracker", about = "Production order tracker")]
struct Cli {
    /// SQLite database file (created if missing).
    #[arg(long = "database", default_value = DEFAULT_DB_PATH)]
    database: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the menu on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::new(cli.database);

    let store = ProductionStore::open(&config)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    run_session(store, io::stdin().lock(), io::stdout().lock()).context("menu loop aborted")?;
    Ok(())
}
