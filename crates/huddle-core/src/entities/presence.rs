//! Presence record - a user's realtime availability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Presence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Offline,
}

impl PresenceStatus {
    /// String form used on the wire and in the database
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Offline => "offline",
        }
    }

    /// Parse from the wire/database string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(Self::Online),
            "idle" => Some(Self::Idle),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presence record; the authoritative copy lives in the persistence gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: Snowflake,
    pub status: PresenceStatus,
    pub updated_at: DateTime<Utc>,
}

impl Presence {
    /// Create a presence record stamped now
    pub fn new(user_id: Snowflake, status: PresenceStatus) -> Self {
        Self {
            user_id,
            status,
            updated_at: Utc::now(),
        }
    }
}
