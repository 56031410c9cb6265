//! Live fan-out of notifications to subscribers

use crate::events::notification::Notification;
use tokio::sync::broadcast;

/// Maximum number of notifications to buffer per subscriber
const BROADCAST_CAPACITY: usize = 100;

/// Broadcaster for committed notifications
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Publish to every current subscriber
    pub fn publish(&self, notification: Notification) {
        // No subscribers is not an error
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
