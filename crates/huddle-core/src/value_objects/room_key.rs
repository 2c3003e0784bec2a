//! Room key - canonical identifier for a broadcast/subscription scope
//!
//! A room is either a text channel or a DM thread. The same key doubles as
//! the index for voice rooms, under a distinct `voice:` namespace so voice
//! pub/sub groups never collide with the text rooms they shadow.

use crate::value_objects::Snowflake;
use std::fmt;

/// Prefix for channel-backed rooms
pub const CHANNEL_ROOM_PREFIX: &str = "channel:";
/// Prefix for thread-backed rooms
pub const THREAD_ROOM_PREFIX: &str = "thread:";
/// Namespace prefix for voice rooms
pub const VOICE_NAMESPACE: &str = "voice:";

/// Discriminated room identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// A text or voice channel inside a server
    Channel(Snowflake),
    /// A direct-message thread
    Thread(Snowflake),
}

impl RoomKey {
    /// Create a channel room key
    #[must_use]
    pub fn channel(channel_id: Snowflake) -> Self {
        Self::Channel(channel_id)
    }

    /// Create a thread room key
    #[must_use]
    pub fn thread(thread_id: Snowflake) -> Self {
        Self::Thread(thread_id)
    }

    /// Canonical name for text fan-out (`channel:<id>` / `thread:<id>`)
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Channel(id) => format!("{CHANNEL_ROOM_PREFIX}{id}"),
            Self::Thread(id) => format!("{THREAD_ROOM_PREFIX}{id}"),
        }
    }

    /// Namespaced name for voice-room indexing (`voice:channel:<id>` / `voice:thread:<id>`)
    #[must_use]
    pub fn voice_name(&self) -> String {
        format!("{VOICE_NAMESPACE}{}", self.name())
    }

    /// The channel id, if this is a channel room
    #[must_use]
    pub fn channel_id(&self) -> Option<Snowflake> {
        match self {
            Self::Channel(id) => Some(*id),
            Self::Thread(_) => None,
        }
    }

    /// The thread id, if this is a thread room
    #[must_use]
    pub fn thread_id(&self) -> Option<Snowflake> {
        match self {
            Self::Thread(id) => Some(*id),
            Self::Channel(_) => None,
        }
    }

    /// Parse a canonical text-room name
    pub fn parse(name: &str) -> Result<Self, RoomKeyParseError> {
        if let Some(id) = name.strip_prefix(CHANNEL_ROOM_PREFIX) {
            return id
                .parse::<i64>()
                .map(|id| Self::Channel(Snowflake::new(id)))
                .map_err(|_| RoomKeyParseError::InvalidId);
        }
        if let Some(id) = name.strip_prefix(THREAD_ROOM_PREFIX) {
            return id
                .parse::<i64>()
                .map(|id| Self::Thread(Snowflake::new(id)))
                .map_err(|_| RoomKeyParseError::InvalidId);
        }
        Err(RoomKeyParseError::UnknownScope)
    }

    /// Parse a voice-namespaced room name
    pub fn parse_voice(name: &str) -> Result<Self, RoomKeyParseError> {
        name.strip_prefix(VOICE_NAMESPACE)
            .ok_or(RoomKeyParseError::UnknownScope)
            .and_then(Self::parse)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error when parsing a room key from its canonical name
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomKeyParseError {
    #[error("unknown room scope")]
    UnknownScope,
    #[error("invalid room id")]
    InvalidId,
}
