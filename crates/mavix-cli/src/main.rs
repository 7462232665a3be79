//! mavix - KMP-aware Maven Central index CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mavix_cli::cmd;
use mavix_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mavix_cli=debug,mavix_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Index {
            allowlist_file,
            index_kmp_all_versions,
            max_concurrency,
            db_path,
        } => cmd::index::index(allowlist_file, index_kmp_all_versions, max_concurrency, db_path).await,
        Commands::Search {
            text,
            platform,
            full_native_targets,
            db_path,
        } => cmd::search::search(&text, platform.as_deref(), full_native_targets, db_path),
    }
}
