//! SQLite-backed artifact index.
//!
//! One row per `(group_id, artifact_id, version)` coordinate; writes are
//! idempotent upserts, so re-running a crawl converges to the same index.

use std::path::Path;

use mavix_schema::Artifact;
use rusqlite::{Connection, params};
use thiserror::Error;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS artifacts (
    group_id TEXT NOT NULL,
    artifact_id TEXT NOT NULL,
    version TEXT NOT NULL,
    supported_platforms TEXT,
    is_latest INTEGER NOT NULL,
    PRIMARY KEY (group_id, artifact_id, version)
);
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store worker is no longer running")]
    ActorDied,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Platform tags, `None` for non-KMP artifacts.
    pub supported_platforms: Option<Vec<String>>,
    pub is_latest: bool,
}

/// Artifact index over one SQLite connection.
///
/// Connections are not `Sync`; mutating access during a crawl goes
/// through the actor in [`super::actor`], which owns its connection on a
/// dedicated thread. Read-only use (search) may open its own.
#[derive(Debug)]
pub struct IndexDb {
    conn: Connection,
}

impl IndexDb {
    /// Opens (creating if needed) the index database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the parent directory cannot be
    /// created, or [`StoreError::Sqlite`] if the database cannot be
    /// opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// In-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the database cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Drops every indexed artifact.
    pub fn truncate(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM artifacts", [])?;
        Ok(())
    }

    /// Upserts a batch in one transaction, keyed by coordinate.
    pub fn add_artifacts(&mut self, artifacts: &[Artifact]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO artifacts \
                 (group_id, artifact_id, version, supported_platforms, is_latest) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for artifact in artifacts {
                let platforms = artifact
                    .supported_platforms
                    .as_ref()
                    .map(|tags| tags.iter().cloned().collect::<Vec<_>>().join(","));
                stmt.execute(params![
                    artifact.group_id,
                    artifact.artifact_id,
                    artifact.version,
                    platforms,
                    artifact.is_latest_version,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Ranked name search: exact artifact-id matches first, then prefix
    /// matches, then substring matches; within a rank, latest versions
    /// first, then most recently indexed. An optional platform prompt
    /// keeps only KMP artifacts whose tag list contains it.
    pub fn search_ranked(
        &self,
        name_prompt: &str,
        platform_prompt: Option<&str>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT group_id, artifact_id, version, supported_platforms, is_latest \
             FROM artifacts \
             WHERE instr(artifact_id, ?1) > 0 \
               AND (?2 IS NULL OR (supported_platforms IS NOT NULL \
                                   AND instr(supported_platforms, ?2) > 0)) \
             ORDER BY \
               CASE \
                 WHEN artifact_id = ?1 THEN 0 \
                 WHEN substr(artifact_id, 1, length(?1)) = ?1 THEN 1 \
                 ELSE 2 \
               END, \
               is_latest DESC, \
               rowid DESC",
        )?;
        let hits = stmt
            .query_map(params![name_prompt, platform_prompt], |row| {
                let platforms: Option<String> = row.get(3)?;
                Ok(SearchHit {
                    group_id: row.get(0)?,
                    artifact_id: row.get(1)?,
                    version: row.get(2)?,
                    supported_platforms: platforms
                        .map(|tags| tags.split(',').map(ToString::to_string).collect()),
                    is_latest: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    /// Number of indexed artifacts.
    pub fn count(&self) -> Result<u64, StoreError> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get::<_, u64>(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn artifact(name: &str, version: &str, platforms: Option<&[&str]>, latest: bool) -> Artifact {
        Artifact {
            group_id: "org.example".into(),
            artifact_id: name.into(),
            version: version.into(),
            supported_platforms: platforms
                .map(|tags| tags.iter().map(ToString::to_string).collect::<BTreeSet<_>>()),
            is_latest_version: latest,
        }
    }

    #[test]
    fn upserting_the_same_coordinate_twice_keeps_the_last_write() {
        let mut db = IndexDb::open_in_memory().unwrap();
        db.add_artifacts(&[artifact("demo", "1.0", None, false)]).unwrap();
        db.add_artifacts(&[artifact("demo", "1.0", Some(&["jvm", "js"]), true)])
            .unwrap();

        assert_eq!(db.count().unwrap(), 1);
        let hits = db.search_ranked("demo", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].supported_platforms,
            Some(vec!["js".to_string(), "jvm".to_string()])
        );
        assert!(hits[0].is_latest);
    }

    #[test]
    fn ranks_exact_above_prefix_above_substring() {
        let mut db = IndexDb::open_in_memory().unwrap();
        db.add_artifacts(&[
            artifact("my-ktor-utils", "1.0", None, true),
            artifact("ktor-client", "1.0", None, true),
            artifact("ktor", "1.0", None, true),
        ])
        .unwrap();

        let names: Vec<String> = db
            .search_ranked("ktor", None)
            .unwrap()
            .into_iter()
            .map(|hit| hit.artifact_id)
            .collect();
        assert_eq!(names, vec!["ktor", "ktor-client", "my-ktor-utils"]);
    }

    #[test]
    fn latest_versions_rank_first_within_a_name() {
        let mut db = IndexDb::open_in_memory().unwrap();
        db.add_artifacts(&[
            artifact("demo", "1.0", None, false),
            artifact("demo", "1.1", None, true),
            artifact("demo", "0.9", None, false),
        ])
        .unwrap();

        let versions: Vec<String> = db
            .search_ranked("demo", None)
            .unwrap()
            .into_iter()
            .map(|hit| hit.version)
            .collect();
        assert_eq!(versions[0], "1.1");
    }

    #[test]
    fn platform_prompt_filters_to_matching_kmp_artifacts() {
        let mut db = IndexDb::open_in_memory().unwrap();
        db.add_artifacts(&[
            artifact("kmp-lib", "1.0", Some(&["jvm", "native:linux_x64"]), true),
            artifact("jvm-only-lib", "1.0", None, true),
            artifact("js-lib", "1.0", Some(&["js"]), true),
        ])
        .unwrap();

        let hits = db.search_ranked("lib", Some("jvm")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].artifact_id, "kmp-lib");

        let native = db.search_ranked("lib", Some("native:linux_x64")).unwrap();
        assert_eq!(native.len(), 1);
    }

    #[test]
    fn truncate_empties_the_index() {
        let mut db = IndexDb::open_in_memory().unwrap();
        db.add_artifacts(&[artifact("demo", "1.0", None, true)]).unwrap();
        assert_eq!(db.count().unwrap(), 1);

        db.truncate().unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert!(db.search_ranked("demo", None).unwrap().is_empty());
    }
}
