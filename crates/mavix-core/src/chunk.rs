//! Bounded ordered chunking of the resolution-event stream.

use mavix_schema::ResolutionEvent;
use tokio::sync::mpsc;

/// One drained chunk of the event stream.
#[derive(Debug)]
pub struct EventChunk {
    /// Events in arrival order. Never contains the terminal sentinel.
    pub events: Vec<ResolutionEvent>,
    /// Whether the stream ended (terminal sentinel seen, or channel closed).
    pub finished: bool,
}

/// Drains the next chunk from the event channel.
///
/// Blocks until `max_count` events have arrived or the stream ends, so
/// every chunk is full except the final partial one. The terminal
/// [`ResolutionEvent::Finished`] sentinel is consumed here and never
/// surfaced as an event. A closed channel without a sentinel (a cancelled
/// crawl) also ends the stream.
pub async fn next_chunk(
    rx: &mut mpsc::Receiver<ResolutionEvent>,
    max_count: usize,
) -> EventChunk {
    let mut events = Vec::with_capacity(max_count);
    while events.len() < max_count {
        match rx.recv().await {
            Some(ResolutionEvent::Finished) | None => {
                return EventChunk {
                    events,
                    finished: true,
                };
            }
            Some(event) => events.push(event),
        }
    }
    EventChunk {
        events,
        finished: false,
    }
}
