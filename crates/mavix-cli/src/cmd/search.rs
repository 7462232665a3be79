//! Search command

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::paths::default_db_path;
use crate::store::IndexDb;

/// Queries the local index built by `mavix index`.
pub fn search(
    text: &str,
    platform: Option<&str>,
    full_native_targets: bool,
    db_path: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();

    let db_path = db_path.unwrap_or_else(default_db_path);
    if !db_path.exists() {
        bail!(
            "No index found at {}. Run 'mavix index' first.",
            db_path.display()
        );
    }

    let db = IndexDb::open(&db_path).context("Failed to open index")?;
    let results = db.search_ranked(text, platform)?;

    if results.is_empty() {
        bail!("No artifacts match the '{text}' prompt");
    }

    println!("Found the matching artifacts:");
    for (idx, hit) in results.iter().enumerate() {
        println!(
            "{}) {}:{}:{}",
            idx + 1,
            hit.group_id,
            hit.artifact_id,
            hit.version
        );
        if let Some(platforms) = &hit.supported_platforms {
            println!("\t KMP: {}", format_platforms(platforms, full_native_targets));
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "SEARCH COMPLETE {} matches, elapsed {:.2}s",
        results.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Formats a platform tag list, collapsing `native:<target>` tags into a
/// single `native` unless full targets were requested.
fn format_platforms(platforms: &[String], full_native_targets: bool) -> String {
    let mut tags: Vec<String> = if full_native_targets {
        platforms.to_vec()
    } else {
        platforms
            .iter()
            .map(|tag| tag.split(':').next().unwrap_or(tag).to_string())
            .collect()
    };
    tags.sort();
    tags.dedup();
    tags.join(", ")
}
