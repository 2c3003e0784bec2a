//! Event bus abstraction over pub/sub.
//!
//! The gateway routes all fan-out through this trait so tests can swap the
//! Redis transport for an in-memory one.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::pubsub::{PubSubChannel, PubSubEvent, Publisher, ReceivedMessage, Subscriber};

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Cross-instance event transport
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to a channel
    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> BusResult<()>;

    /// Start receiving events published to the given channels
    async fn subscribe(&self, channels: &[PubSubChannel]) -> BusResult<()>;

    /// Stop receiving events from the given channels
    async fn unsubscribe(&self, channels: &[PubSubChannel]) -> BusResult<()>;

    /// Get a receiver for all events this instance is subscribed to
    fn receiver(&self) -> broadcast::Receiver<ReceivedMessage>;
}

/// Redis-backed event bus
pub struct RedisEventBus {
    publisher: Publisher,
    subscriber: Subscriber,
}

impl RedisEventBus {
    /// Create a new Redis event bus
    #[must_use]
    pub fn new(publisher: Publisher, subscriber: Subscriber) -> Self {
        Self {
            publisher,
            subscriber,
        }
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> BusResult<()> {
        self.publisher
            .publish(channel, event)
            .await
            .map(|_| ())
            .map_err(|e| BusError::Publish(e.to_string()))
    }

    async fn subscribe(&self, channels: &[PubSubChannel]) -> BusResult<()> {
        self.subscriber
            .subscribe(channels)
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))
    }

    async fn unsubscribe(&self, channels: &[PubSubChannel]) -> BusResult<()> {
        self.subscriber
            .unsubscribe(channels)
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))
    }

    fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.subscriber.receiver()
    }
}
