//! mavix - KMP-aware Maven Central index
//!
//! # Overview
//!
//! mavix crawls Maven Central's static file layout for a curated
//! allow-list of groups and artifacts, classifies each artifact's Kotlin
//! Multiplatform variants, and stores the coordinates in a local SQLite
//! index for ranked search.
//!
//! # Architecture
//!
//! - **Actor pattern**: all index writes are serialized through
//!   [`store::StoreHandle`], a dedicated SQLite thread.
//! - **Event pipeline**: the crawl engine in `mavix-core` streams
//!   resolution events into chunked transactions.
//!
//! # Directory layout
//!
//! ```text
//! ~/.mavix/
//! └── index.db    # SQLite artifact index
//! ```

pub mod cmd;
pub mod paths;
pub mod store;

pub use store::StoreHandle;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mavix")]
#[command(author, version, about = "mavix - KMP-aware Maven Central index")]
pub struct Cli {
    /// Print verbose progress output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crawl the remote repository and (re)build the local index
    Index {
        /// Path to a .csv allowlist file with a `namespace,name` header.
        /// Defaults to a builtin list of sample groups.
        #[arg(long)]
        allowlist_file: Option<PathBuf>,

        /// Resolve KMP platforms for all versions, not only the latest.
        /// Can significantly increase indexing time.
        #[arg(long)]
        index_kmp_all_versions: bool,

        /// Maximum concurrent repository fetches
        #[arg(long, default_value_t = 64)]
        max_concurrency: usize,

        /// Index database path (defaults to ~/.mavix/index.db)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Search the local index built by 'mavix index'
    Search {
        /// Search prompt matched against artifact names
        text: String,

        /// Only return artifacts supporting this platform tag
        #[arg(long)]
        platform: Option<String>,

        /// Display the complete list of native targets instead of just "native"
        #[arg(long)]
        full_native_targets: bool,

        /// Index database path (defaults to ~/.mavix/index.db)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}
