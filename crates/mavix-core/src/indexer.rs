//! Single-use crawl driver: resolver → event channel → batcher → sink.

use std::sync::Arc;

use mavix_schema::{Allowlist, ResolutionEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chunk;
use crate::resolver::{ResolveOptions, Resolver};
use crate::sink::{IndexSink, SinkError};
use crate::transport::Transport;

/// Default number of events batched into one persistence transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Event-channel capacity; absorbs resolution bursts while a batch write
/// is in flight.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Persistence failed: {0}")]
    Sink(#[from] SinkError),
}

/// Totals of one completed crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    /// Artifacts written to the index.
    pub resolved: usize,
    /// Explicitly requested entries that could not be resolved.
    pub unresolved: usize,
}

/// Crawls the allow-list and stores the results through the sink.
///
/// Single-use object; [`Indexer::index`] consumes it. The resolution
/// fan-out and the persistence path run concurrently: events flow through
/// a bounded channel into ordered chunks, and each chunk is handed to the
/// sink's serialized worker, so disk work never contends with the
/// network-bound resolution pool.
#[derive(Debug)]
pub struct Indexer<S> {
    allowlist: Allowlist,
    options: ResolveOptions,
    transport: Transport,
    sink: S,
    chunk_size: usize,
}

impl<S: IndexSink> Indexer<S> {
    pub fn new(
        allowlist: Allowlist,
        options: ResolveOptions,
        transport: Transport,
        sink: S,
    ) -> Self {
        Self {
            allowlist,
            options,
            transport,
            sink,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the persistence batch size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Drives one full crawl to completion.
    ///
    /// Truncates the sink, resolves everything, and upserts resolved
    /// artifacts in chunked transactions. Unresolved entries are reported
    /// and counted but never fail the run; a crawl with zero resolved
    /// artifacts still completes successfully. Dropping the returned
    /// future cancels the crawl without writing a partial batch.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Sink`] when a batch write fails; resolved
    /// events of the failed chunk are carried in the error path rather
    /// than silently discarded.
    pub async fn index(self) -> Result<IndexSummary, IndexError> {
        let Self {
            allowlist,
            options,
            transport,
            sink,
            chunk_size,
        } = self;

        info!("Starting indexing using allowlist: {allowlist}");
        sink.truncate().await?;

        let (events, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let resolver = Resolver::new(Arc::new(transport), options, events);

        let crawl = async move { resolver.resolve_all(&allowlist).await };

        let consume = async {
            let mut resolved = 0usize;
            let mut unresolved = 0usize;
            loop {
                let chunk = chunk::next_chunk(&mut rx, chunk_size).await;
                let mut batch = Vec::with_capacity(chunk.events.len());
                for event in chunk.events {
                    match event {
                        ResolutionEvent::Resolved(artifact) => {
                            debug!(coordinate = %artifact.coordinate(), "resolved");
                            batch.push(artifact);
                        }
                        ResolutionEvent::Unresolved {
                            group_id,
                            artifact_id,
                        } => {
                            warn!("Unresolved: {group_id}:{artifact_id}");
                            unresolved += 1;
                        }
                        ResolutionEvent::Finished => {
                            unreachable!("terminal sentinel is consumed by next_chunk")
                        }
                    }
                }
                if !batch.is_empty() {
                    resolved += batch.len();
                    sink.add_artifacts(batch).await?;
                    debug!(total = resolved, "batch written to index");
                }
                if chunk.finished {
                    return Ok::<(usize, usize), SinkError>((resolved, unresolved));
                }
            }
        };

        let ((), outcome) = tokio::join!(crawl, consume);
        let (resolved, unresolved) = outcome?;

        info!(resolved, unresolved, "indexing finished");
        Ok(IndexSummary {
            resolved,
            unresolved,
        })
    }
}
