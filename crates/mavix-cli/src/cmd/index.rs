//! Index command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use mavix_core::{Indexer, ResolveOptions, Transport};
use mavix_schema::Allowlist;

use crate::paths::default_db_path;
use crate::store::StoreHandle;

/// Crawls the repository per the allow-list and rebuilds the local index.
pub async fn index(
    allowlist_file: Option<PathBuf>,
    index_kmp_all_versions: bool,
    max_concurrency: usize,
    db_path: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();

    let allowlist = match allowlist_file {
        Some(path) => Allowlist::from_csv_file(&path).context("Failed to load allowlist")?,
        None => Allowlist::example_groups(),
    };

    let db_path = db_path.unwrap_or_else(default_db_path);
    tracing::debug!(db_path = %db_path.display(), "opening index database");
    let store = StoreHandle::spawn(&db_path).context("Failed to open index database")?;
    let transport = Transport::new().context("Failed to initialize HTTP transport")?;
    let options = ResolveOptions {
        resolve_kmp_latest_only: !index_kmp_all_versions,
        max_concurrency: max_concurrency.max(1),
        ..ResolveOptions::default()
    };

    println!("Indexing using allowlist: {allowlist}");
    let summary = Indexer::new(allowlist, options, transport, store)
        .index()
        .await
        .context("Indexing failed")?;

    let elapsed = start.elapsed();
    println!(
        "INDEX COMPLETE {} artifacts ({} unresolved), elapsed {:.2}s",
        summary.resolved,
        summary.unresolved,
        elapsed.as_secs_f64()
    );
    println!(
        "Index data saved at {} for use by 'mavix search'",
        db_path.display()
    );
    Ok(())
}
