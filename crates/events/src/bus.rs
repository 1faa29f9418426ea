//! Broadcast fan-out for run lifecycle events.

use tokio::sync::broadcast;

use crate::types::EventEnvelope;

/// A run emits a handful of envelopes (creation, three status changes, end),
/// so the channel only needs enough depth to absorb bursts from many
/// concurrent runs before a slow subscriber starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Fan-out for run lifecycle events.
///
/// Publishing never blocks the orchestrator: with no subscribers the envelope
/// is dropped, and a subscriber that falls behind loses the oldest envelopes
/// rather than slowing the run that produced them.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Deliver the envelope to current subscribers, returning how many
    /// received it. Zero means nobody was listening and the envelope is gone.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Open a subscription. Only envelopes published after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
