//! Store actor - thread-safe access to SQLite.
//!
//! SQLite connections are not `Sync`, so the index connection lives on a
//! dedicated background thread and all access goes through message
//! passing. This is also what serializes writes: the crawl engine and
//! anything else holding a [`StoreHandle`] funnel through one event loop,
//! one transaction at a time.

use std::fmt;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use mavix_core::{IndexSink, SinkError};
use mavix_schema::Artifact;
use tokio::sync::oneshot;

use super::db::{IndexDb, SearchHit, StoreError};

/// Requests understood by the store actor.
pub enum StoreEvent {
    /// Drop all indexed artifacts
    Truncate {
        resp: oneshot::Sender<Result<(), StoreError>>,
    },
    /// Upsert a batch of artifacts in one transaction
    AddArtifacts {
        artifacts: Vec<Artifact>,
        resp: oneshot::Sender<Result<(), StoreError>>,
    },
    /// Ranked name (+ optional platform) search
    SearchRanked {
        name_prompt: String,
        platform_prompt: Option<String>,
        resp: oneshot::Sender<Result<Vec<SearchHit>, StoreError>>,
    },
    /// Number of indexed artifacts
    Count {
        resp: oneshot::Sender<Result<u64, StoreError>>,
    },
}

impl fmt::Debug for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncate { .. } => f.debug_struct("Truncate").finish_non_exhaustive(),
            Self::AddArtifacts { artifacts, .. } => f
                .debug_struct("AddArtifacts")
                .field("count", &artifacts.len())
                .finish_non_exhaustive(),
            Self::SearchRanked {
                name_prompt,
                platform_prompt,
                ..
            } => f
                .debug_struct("SearchRanked")
                .field("name_prompt", name_prompt)
                .field("platform_prompt", platform_prompt)
                .finish_non_exhaustive(),
            Self::Count { .. } => f.debug_struct("Count").finish_non_exhaustive(),
        }
    }
}

/// A handle to the store actor. `Send + Sync + Clone`; the actor thread
/// exits once every handle is dropped.
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreEvent>,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}

impl StoreHandle {
    /// Opens the index at `path` and spawns the actor thread.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened.
    pub fn spawn(path: &Path) -> Result<Self, StoreError> {
        let db = IndexDb::open(path)?;
        Ok(Self::spawn_with(db))
    }

    /// Actor over an in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be created.
    pub fn spawn_in_memory() -> Result<Self, StoreError> {
        let db = IndexDb::open_in_memory()?;
        Ok(Self::spawn_with(db))
    }

    fn spawn_with(db: IndexDb) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || run_store_event_loop(db, receiver));
        Self { sender }
    }

    /// Sends a request and waits for the actor's reply.
    async fn request<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreEvent,
    {
        let (tx, rx) = oneshot::channel();
        self.sender.send(f(tx)).map_err(|_| StoreError::ActorDied)?;
        rx.await.map_err(|_| StoreError::ActorDied)?
    }

    pub async fn truncate(&self) -> Result<(), StoreError> {
        self.request(|resp| StoreEvent::Truncate { resp }).await
    }

    pub async fn add_artifacts(&self, artifacts: Vec<Artifact>) -> Result<(), StoreError> {
        self.request(|resp| StoreEvent::AddArtifacts { artifacts, resp })
            .await
    }

    pub async fn search_ranked(
        &self,
        name_prompt: String,
        platform_prompt: Option<String>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.request(|resp| StoreEvent::SearchRanked {
            name_prompt,
            platform_prompt,
            resp,
        })
        .await
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.request(|resp| StoreEvent::Count { resp }).await
    }
}

fn run_store_event_loop(mut db: IndexDb, receiver: mpsc::Receiver<StoreEvent>) {
    while let Ok(event) = receiver.recv() {
        match event {
            StoreEvent::Truncate { resp } => {
                let _ = resp.send(db.truncate());
            }
            StoreEvent::AddArtifacts { artifacts, resp } => {
                let _ = resp.send(db.add_artifacts(&artifacts));
            }
            StoreEvent::SearchRanked {
                name_prompt,
                platform_prompt,
                resp,
            } => {
                let _ = resp.send(db.search_ranked(&name_prompt, platform_prompt.as_deref()));
            }
            StoreEvent::Count { resp } => {
                let _ = resp.send(db.count());
            }
        }
    }
    // Every handle dropped: the loop ends and the connection closes
}

impl From<StoreError> for SinkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActorDied => SinkError::Closed,
            other => SinkError::Storage(other.to_string()),
        }
    }
}

#[async_trait]
impl IndexSink for StoreHandle {
    async fn truncate(&self) -> Result<(), SinkError> {
        StoreHandle::truncate(self).await.map_err(SinkError::from)
    }

    async fn add_artifacts(&self, artifacts: Vec<Artifact>) -> Result<(), SinkError> {
        StoreHandle::add_artifacts(self, artifacts)
            .await
            .map_err(SinkError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn artifact(name: &str, version: &str) -> Artifact {
        Artifact {
            group_id: "org.example".into(),
            artifact_id: name.into(),
            version: version.into(),
            supported_platforms: Some(BTreeSet::from(["jvm".to_string()])),
            is_latest_version: true,
        }
    }

    #[tokio::test]
    async fn round_trips_through_the_actor() {
        let store = StoreHandle::spawn_in_memory().unwrap();
        store
            .add_artifacts(vec![artifact("demo", "1.0"), artifact("other", "2.0")])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let hits = store
            .search_ranked("demo".to_string(), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].artifact_id, "demo");

        store.truncate().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clones_share_the_same_actor() {
        let store = StoreHandle::spawn_in_memory().unwrap();
        let clone = store.clone();

        clone.add_artifacts(vec![artifact("demo", "1.0")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn works_through_the_sink_interface() {
        let store = StoreHandle::spawn_in_memory().unwrap();
        let sink: &dyn IndexSink = &store;

        sink.add_artifacts(vec![artifact("demo", "1.0")]).await.unwrap();
        sink.truncate().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
