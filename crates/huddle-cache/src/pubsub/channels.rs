//! Pub/Sub channel definitions.
//!
//! Defines the channel naming conventions for Redis Pub/Sub. Room channels
//! reuse the room-key naming (`channel:{id}` / `thread:{id}`) so the fan-out
//! topic and the room a connection joined are the same string.

use huddle_core::{RoomKey, Snowflake};

/// Channel prefix for voice signaling events within a room
pub const VOICE_CHANNEL_PREFIX: &str = "voice:";
/// Channel prefix for user-specific events
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Channel for broadcast events (all connected clients)
pub const BROADCAST_CHANNEL: &str = "broadcast";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Events for everyone joined to a room
    Room(RoomKey),
    /// Voice membership events for a room
    Voice(RoomKey),
    /// Events for a specific user (all their connections)
    User(Snowflake),
    /// Broadcast to all connected clients
    Broadcast,
    /// Custom channel name
    Custom(String),
}

impl PubSubChannel {
    /// Create a room channel
    #[must_use]
    pub fn room(key: RoomKey) -> Self {
        Self::Room(key)
    }

    /// Create a voice channel for a room
    #[must_use]
    pub fn voice(key: RoomKey) -> Self {
        Self::Voice(key)
    }

    /// Create a user channel
    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Create a broadcast channel
    #[must_use]
    pub fn broadcast() -> Self {
        Self::Broadcast
    }

    /// Create a custom channel
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Room(key) => key.name(),
            Self::Voice(key) => key.voice_name(),
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Broadcast => BROADCAST_CHANNEL.to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == BROADCAST_CHANNEL {
            return Self::Broadcast;
        }

        if let Some(rest) = name.strip_prefix(VOICE_CHANNEL_PREFIX) {
            if let Ok(key) = RoomKey::parse(rest) {
                return Self::Voice(key);
            }
        }

        if let Ok(key) = RoomKey::parse(name) {
            return Self::Room(key);
        }

        if let Some(id_str) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            if let Ok(id) = id_str.parse::<i64>() {
                return Self::User(Snowflake::new(id));
            }
        }

        Self::Custom(name.to_string())
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
