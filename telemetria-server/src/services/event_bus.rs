use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Reading;

/// Event fanned out to live subscribers whenever a reading is stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ReadingEvent {
    Created(Reading),
}

/// In-memory fan-out channel for newly ingested readings.
///
/// Every subscriber gets its own buffered receiver; a slow one falls behind
/// (`Lagged`) and loses the oldest events instead of blocking the publisher
/// or the other subscribers. Subscribers only see events published after they
/// joined, there is no backlog or replay.
pub struct EventBus {
    sender: broadcast::Sender<ReadingEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);

        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReadingEvent> {
        self.sender.subscribe()
    }

    /// Deliver the event to every current subscriber, returning how many
    /// received it. Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ReadingEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
