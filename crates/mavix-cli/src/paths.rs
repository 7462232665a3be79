//! Filesystem locations used by mavix.

use std::path::PathBuf;

/// The mavix home directory (`~/.mavix`), created lazily by the store.
pub fn mavix_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mavix")
}

/// Default location of the SQLite artifact index.
pub fn default_db_path() -> PathBuf {
    mavix_home().join("index.db")
}
