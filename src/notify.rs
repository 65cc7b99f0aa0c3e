use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{ChangeEvent, Topic};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub: one channel per entity-kind topic, so an embedding
/// presentation layer can refresh exactly the views a mutation touched
/// instead of polling.
pub struct NotifyHub {
    channels: DashMap<Topic, broadcast::Sender<ChangeEvent>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a topic. Creates the channel if needed.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<ChangeEvent> {
        let sender = self
            .channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, topic: Topic, event: &ChangeEvent) {
        if let Some(sender) = self.channels.get(&topic) {
            let _ = sender.send(event.clone());
        }
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}
