//! A single WebSocket connection
//!
//! The identity is resolved before the upgrade and never changes; everything
//! mutable on the connection is its room subscriptions and heartbeat clock.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};

use huddle_core::{RoomKey, Snowflake};

use crate::protocol::ServerFrame;

/// Authenticated principal behind a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Owning user
    pub user_id: Snowflake,
    /// Session the access token was bound to
    pub session_id: String,
}

/// Error sending a frame to a connection
#[derive(Debug, thiserror::Error)]
#[error("Connection closed")]
pub struct SendError;

/// An active WebSocket connection
pub struct Connection {
    /// Unique id for this socket (one user may hold several)
    connection_id: String,

    /// Immutable authenticated identity
    identity: Identity,

    /// Outgoing frame channel, consumed by the send task
    sender: mpsc::Sender<ServerFrame>,

    /// Text rooms this connection joined
    rooms: RwLock<HashSet<RoomKey>>,

    /// Voice rooms this connection joined
    voice_rooms: RwLock<HashSet<RoomKey>>,

    /// Last client heartbeat (or connect time)
    last_heartbeat: RwLock<Instant>,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        connection_id: String,
        identity: Identity,
        sender: mpsc::Sender<ServerFrame>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection_id,
            identity,
            sender,
            rooms: RwLock::new(HashSet::new()),
            voice_rooms: RwLock::new(HashSet::new()),
            last_heartbeat: RwLock::new(Instant::now()),
        })
    }

    /// Get the connection id
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Get the authenticated identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the owning user id
    pub fn user_id(&self) -> Snowflake {
        self.identity.user_id
    }

    /// Get the session id the token was bound to
    pub fn session_id(&self) -> &str {
        &self.identity.session_id
    }

    /// Queue a frame for delivery
    pub async fn send(&self, frame: ServerFrame) -> Result<(), SendError> {
        self.sender.send(frame).await.map_err(|_| SendError)
    }

    /// Check if the outgoing channel has been closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Join a text room; returns false if already joined
    pub async fn join_room(&self, key: RoomKey) -> bool {
        self.rooms.write().await.insert(key)
    }

    /// Leave a text room; returns false if not joined
    pub async fn leave_room(&self, key: RoomKey) -> bool {
        self.rooms.write().await.remove(&key)
    }

    /// Check membership in a text room
    pub async fn in_room(&self, key: RoomKey) -> bool {
        self.rooms.read().await.contains(&key)
    }

    /// Get all joined text rooms
    pub async fn rooms(&self) -> Vec<RoomKey> {
        self.rooms.read().await.iter().copied().collect()
    }

    /// Track a joined voice room; returns false if already tracked
    pub async fn join_voice_room(&self, key: RoomKey) -> bool {
        self.voice_rooms.write().await.insert(key)
    }

    /// Untrack a voice room; returns false if not tracked
    pub async fn leave_voice_room(&self, key: RoomKey) -> bool {
        self.voice_rooms.write().await.remove(&key)
    }

    /// Get all joined voice rooms
    pub async fn voice_rooms(&self) -> Vec<RoomKey> {
        self.voice_rooms.read().await.iter().copied().collect()
    }

    /// Take all joined voice rooms, leaving the set empty
    ///
    /// Used by disconnect reaping so the teardown runs exactly once even if
    /// cleanup is re-entered.
    pub async fn drain_voice_rooms(&self) -> Vec<RoomKey> {
        self.voice_rooms.write().await.drain().collect()
    }

    /// Record a client heartbeat
    pub async fn mark_heartbeat(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    /// Time elapsed since the last heartbeat
    pub async fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.read().await.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.connection_id)
            .field("user_id", &self.identity.user_id)
            .finish()
    }
}
