//! Channel entity - a text or voice channel inside a server

use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// Channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
}

/// Channel entity (the slice of the row the gateway reads)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: Snowflake,
    pub server_id: Snowflake,
    pub kind: ChannelKind,
    pub name: String,
}

impl Channel {
    /// Check if this is a voice channel
    #[inline]
    pub fn is_voice(&self) -> bool {
        self.kind == ChannelKind::Voice
    }
}
