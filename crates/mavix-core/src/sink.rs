//! Persistence interface the crawl engine writes through.
//!
//! The engine never talks to storage directly; it hands resolved batches
//! to an [`IndexSink`] whose implementation owns the connection and
//! serializes all writes (the CLI backs this with a dedicated SQLite
//! actor thread).

use async_trait::async_trait;
use mavix_schema::Artifact;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    /// The persistence worker is gone (its thread or channel died).
    #[error("Persistence worker is no longer running")]
    Closed,

    /// A storage-level failure (transaction, I/O, constraint).
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Transactional upsert store for resolved artifacts.
#[async_trait]
pub trait IndexSink: Send + Sync {
    /// Drops all indexed artifacts. Called once at the start of a crawl.
    async fn truncate(&self) -> Result<(), SinkError>;

    /// Upserts one batch in a single transaction, keyed by
    /// `(group_id, artifact_id, version)`.
    async fn add_artifacts(&self, artifacts: Vec<Artifact>) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: IndexSink + ?Sized> IndexSink for std::sync::Arc<T> {
    async fn truncate(&self) -> Result<(), SinkError> {
        (**self).truncate().await
    }

    async fn add_artifacts(&self, artifacts: Vec<Artifact>) -> Result<(), SinkError> {
        (**self).add_artifacts(artifacts).await
    }
}

/// In-memory sink with upsert semantics, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: std::sync::Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored artifacts in insertion order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IndexSink for MemorySink {
    async fn truncate(&self) -> Result<(), SinkError> {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }

    async fn add_artifacts(&self, artifacts: Vec<Artifact>) -> Result<(), SinkError> {
        let mut stored = self.artifacts.lock().unwrap_or_else(|e| e.into_inner());
        for artifact in artifacts {
            let key = (
                artifact.group_id.clone(),
                artifact.artifact_id.clone(),
                artifact.version.clone(),
            );
            match stored.iter_mut().find(|a| {
                (a.group_id.as_str(), a.artifact_id.as_str(), a.version.as_str())
                    == (key.0.as_str(), key.1.as_str(), key.2.as_str())
            }) {
                Some(existing) => *existing = artifact,
                None => stored.push(artifact),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn artifact(version: &str, platforms: Option<&[&str]>) -> Artifact {
        Artifact {
            group_id: "org.example".into(),
            artifact_id: "demo".into(),
            version: version.into(),
            supported_platforms: platforms
                .map(|tags| tags.iter().map(ToString::to_string).collect::<BTreeSet<_>>()),
            is_latest_version: false,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_with_last_write() {
        let sink = MemorySink::new();
        sink.add_artifacts(vec![artifact("1.0", None)]).await.unwrap();
        sink.add_artifacts(vec![artifact("1.0", Some(&["jvm", "js"]))])
            .await
            .unwrap();

        let stored = sink.artifacts();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            stored[0].supported_platforms,
            Some(BTreeSet::from(["jvm".to_string(), "js".to_string()]))
        );
    }

    #[tokio::test]
    async fn truncate_clears_everything() {
        let sink = MemorySink::new();
        sink.add_artifacts(vec![artifact("1.0", None), artifact("1.1", None)])
            .await
            .unwrap();
        assert_eq!(sink.len(), 2);

        sink.truncate().await.unwrap();
        assert!(sink.is_empty());
    }
}
