//! Redis Pub/Sub publisher
//!
//! The write half of the event bus: serializes event envelopes and PUBLISHes
//! them on pooled connections. Every gateway instance, this one included,
//! picks them up through its subscriber.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use huddle_core::Snowflake;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., "message.created", "presence.updated")
    pub event_type: String,
    /// Event payload
    pub data: serde_json::Value,
    /// Connection owner to skip when fanning out (the originating user)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_user: Option<Snowflake>,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            exclude_user: None,
        }
    }

    /// Skip the given user's connections when delivering this event
    #[must_use]
    pub fn excluding(mut self, user_id: Snowflake) -> Self {
        self.exclude_user = Some(user_id);
        self
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event, returning how many subscribers saw it
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = self.pool.get().await?.publish(&name, &payload).await?;

        tracing::debug!(
            channel = %name,
            event_type = %event.event_type,
            receivers,
            "event published"
        );

        Ok(receivers)
    }
}
