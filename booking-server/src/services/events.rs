//! Domain event publication
//!
//! In-process fan-out over a broadcast channel. Publishing is
//! fire-and-forget: the booking flow never blocks on, retries, or fails
//! because of event delivery. Downstream consumers (dashboards,
//! notification workers) subscribe and assume at-least-once semantics.

use shared::event::BookingEvent;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<BookingEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Never blocks, never propagates failure.
    pub fn publish(&self, event: BookingEvent) {
        debug!(event = event.name(), "publishing domain event");
        // A send error only means there is no live subscriber right now
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream (observability consumers).
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
