//! Process-local voice room table
//!
//! One mutex guards the whole table; no awaits ever happen under it. A room
//! exists exactly while its participant set is non-empty: creation happens on
//! first join and the last departure removes the entry in the same critical
//! section, so an empty room is never observable.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use huddle_core::{RoomKey, Snowflake};

use crate::protocol::VoiceParticipantView;

/// Result of a voice room join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceJoinOutcome {
    /// True when the user was already in the room (flag refresh, not a join)
    pub rejoined: bool,
}

/// In-memory voice room rosters
pub struct VoiceRegistry {
    /// Room -> participant -> video flag
    rooms: Mutex<HashMap<RoomKey, HashMap<Snowflake, bool>>>,
}

impl VoiceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a user to a room, creating the room if absent
    ///
    /// A user holds at most one membership per room; joining again replaces
    /// the stored video flag.
    pub fn join(&self, key: RoomKey, user_id: Snowflake, video_enabled: bool) -> VoiceJoinOutcome {
        let mut rooms = self.rooms.lock();
        let room = rooms.entry(key).or_default();
        let rejoined = room.insert(user_id, video_enabled).is_some();

        VoiceJoinOutcome { rejoined }
    }

    /// Remove a user from a room, reaping the room when it empties
    ///
    /// Returns false if the user was not a participant.
    pub fn leave(&self, key: RoomKey, user_id: Snowflake) -> bool {
        let mut rooms = self.rooms.lock();
        let Some(room) = rooms.get_mut(&key) else {
            return false;
        };

        if room.remove(&user_id).is_none() {
            return false;
        }

        if room.is_empty() {
            rooms.remove(&key);
        }

        true
    }

    /// Update a participant's video flag
    ///
    /// Returns false if the user is not in the room.
    pub fn set_video(&self, key: RoomKey, user_id: Snowflake, video_enabled: bool) -> bool {
        let mut rooms = self.rooms.lock();
        rooms
            .get_mut(&key)
            .and_then(|room| room.get_mut(&user_id))
            .map(|flag| *flag = video_enabled)
            .is_some()
    }

    /// Check whether a user is currently in the room
    pub fn contains(&self, key: RoomKey, user_id: Snowflake) -> bool {
        self.rooms
            .lock()
            .get(&key)
            .is_some_and(|room| room.contains_key(&user_id))
    }

    /// Snapshot the room roster, excluding one user (typically the caller)
    pub fn participants_excluding(
        &self,
        key: RoomKey,
        exclude: Snowflake,
    ) -> Vec<VoiceParticipantView> {
        self.rooms
            .lock()
            .get(&key)
            .map(|room| {
                room.iter()
                    .filter(|(user_id, _)| **user_id != exclude)
                    .map(|(user_id, video_enabled)| VoiceParticipantView {
                        user_id: *user_id,
                        video_enabled: *video_enabled,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rooms currently active
    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Number of participants in a room (0 if absent)
    pub fn participant_count(&self, key: RoomKey) -> usize {
        self.rooms.lock().get(&key).map_or(0, HashMap::len)
    }
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VoiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRegistry")
            .field("rooms", &self.rooms.lock().len())
            .finish()
    }
}
