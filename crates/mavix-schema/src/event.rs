use crate::artifact::Artifact;

/// One outcome on the resolution-event stream between the resolver and the
/// batching consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    /// Artifact was successfully resolved (and, where applicable,
    /// platform-classified).
    Resolved(Artifact),

    /// Artifact was explicitly requested and could not be resolved.
    ///
    /// Never issued for wildcard discovery candidates; those fail silently.
    Unresolved {
        group_id: String,
        artifact_id: String,
    },

    /// Terminal sentinel. Emitted exactly once, after all resolution work
    /// has completed, and only on graceful completion of a crawl.
    Finished,
}
