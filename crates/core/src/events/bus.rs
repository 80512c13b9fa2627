use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::SiteEvent;

/// In-process event bus backed by `tokio::broadcast`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<SiteEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// received it; zero when nobody is listening.
    pub fn publish(&self, event: SiteEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
