//! mavix-core - the concurrent crawl engine.
//!
//! Turns an allow-list into a stream of resolved-or-unresolved artifact
//! events and funnels that stream into batched, transactional persistence:
//!
//! - [`transport`]: read-only document fetches against the repository's
//!   static file layout, with decoding for metadata XML, module JSON, and
//!   directory-listing HTML.
//! - [`resolver`]: task-parallel resolution per allow-list entry, including
//!   wildcard directory discovery and per-version platform probing.
//! - [`chunk`] / [`indexer`]: bounded ordered batching of the event stream
//!   into a single serialized persistence worker.
//! - [`sink`]: the persistence interface the engine writes through.

pub mod chunk;
pub mod indexer;
pub mod resolver;
pub mod sink;
pub mod suffixes;
pub mod transport;

pub use indexer::{IndexError, IndexSummary, Indexer};
pub use resolver::{ResolveOptions, Resolver};
pub use sink::{IndexSink, MemorySink, SinkError};
pub use suffixes::PlatformSuffixes;
pub use transport::{Transport, TransportError};

/// User Agent string for crawl requests
pub const USER_AGENT: &str = concat!("mavix-core/", env!("CARGO_PKG_VERSION"));
