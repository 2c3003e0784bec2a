//! Connection manager
//!
//! Tracks all active connections and the room/user indexes used for local
//! fan-out. Uses `DashMap` for concurrent access.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use huddle_core::{RoomKey, Snowflake};

use super::Connection;
use crate::protocol::ServerFrame;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by connection id
    connections: DashMap<String, Arc<Connection>>,

    /// User id to connection ids
    user_connections: DashMap<Snowflake, HashSet<String>>,

    /// Text room to connection ids
    room_connections: DashMap<RoomKey, HashSet<String>>,

    /// Voice room to connection ids
    voice_connections: DashMap<RoomKey, HashSet<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
            room_connections: DashMap::new(),
            voice_connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a connection and index it by its user
    pub fn add_connection(&self, connection: Arc<Connection>) {
        let connection_id = connection.connection_id().to_string();

        self.user_connections
            .entry(connection.user_id())
            .or_default()
            .insert(connection_id.clone());

        self.connections.insert(connection_id.clone(), connection);

        tracing::debug!(connection_id = %connection_id, "Connection added");
    }

    /// Remove a connection and drop it from every index
    ///
    /// Uses `alter` + `retain` so index cleanup is atomic.
    pub async fn remove_connection(&self, connection_id: &str) {
        if let Some((_, connection)) = self.connections.remove(connection_id) {
            self.user_connections
                .alter(&connection.user_id(), |_, mut ids| {
                    ids.remove(connection_id);
                    ids
                });
            self.user_connections.retain(|_, ids| !ids.is_empty());

            for key in connection.rooms().await {
                self.room_connections.alter(&key, |_, mut ids| {
                    ids.remove(connection_id);
                    ids
                });
            }
            self.room_connections.retain(|_, ids| !ids.is_empty());

            for key in connection.voice_rooms().await {
                self.voice_connections.alter(&key, |_, mut ids| {
                    ids.remove(connection_id);
                    ids
                });
            }
            self.voice_connections.retain(|_, ids| !ids.is_empty());

            tracing::debug!(connection_id = %connection_id, "Connection removed");
        }
    }

    /// Get a connection by id
    pub fn get_connection(&self, connection_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(connection_id).map(|r| r.clone())
    }

    /// Index a connection into a text room
    pub async fn join_room(&self, connection: &Arc<Connection>, key: RoomKey) -> bool {
        if !connection.join_room(key).await {
            return false;
        }

        self.room_connections
            .entry(key)
            .or_default()
            .insert(connection.connection_id().to_string());

        tracing::trace!(
            connection_id = %connection.connection_id(),
            room = %key,
            "Connection joined room"
        );

        true
    }

    /// Drop a connection from a text room
    pub async fn leave_room(&self, connection: &Arc<Connection>, key: RoomKey) -> bool {
        if !connection.leave_room(key).await {
            return false;
        }

        self.room_connections.alter(&key, |_, mut ids| {
            ids.remove(connection.connection_id());
            ids
        });
        self.room_connections.retain(|_, ids| !ids.is_empty());

        tracing::trace!(
            connection_id = %connection.connection_id(),
            room = %key,
            "Connection left room"
        );

        true
    }

    /// Index a connection into a voice room
    pub async fn join_voice_room(&self, connection: &Arc<Connection>, key: RoomKey) -> bool {
        if !connection.join_voice_room(key).await {
            return false;
        }

        self.voice_connections
            .entry(key)
            .or_default()
            .insert(connection.connection_id().to_string());

        true
    }

    /// Drop a connection from a voice room
    pub async fn leave_voice_room(&self, connection: &Arc<Connection>, key: RoomKey) -> bool {
        if !connection.leave_voice_room(key).await {
            return false;
        }

        self.voice_connections.alter(&key, |_, mut ids| {
            ids.remove(connection.connection_id());
            ids
        });
        self.voice_connections.retain(|_, ids| !ids.is_empty());

        true
    }

    /// Drop a connection from a voice room index only
    ///
    /// Used by disconnect reaping after the connection's own set was drained.
    pub fn unindex_voice_room(&self, connection_id: &str, key: RoomKey) {
        self.voice_connections.alter(&key, |_, mut ids| {
            ids.remove(connection_id);
            ids
        });
        self.voice_connections.retain(|_, ids| !ids.is_empty());
    }

    /// Check whether any local connection remains in a text room
    pub fn room_is_empty(&self, key: RoomKey) -> bool {
        !self.room_connections.contains_key(&key)
    }

    /// Check whether any local connection remains in a voice room
    pub fn voice_room_is_empty(&self, key: RoomKey) -> bool {
        !self.voice_connections.contains_key(&key)
    }

    /// Get all connections for a user
    pub fn get_user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        self.user_connections
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.connections.get(id).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn indexed_connections(
        &self,
        index: &DashMap<RoomKey, HashSet<String>>,
        key: RoomKey,
    ) -> Vec<Arc<Connection>> {
        index
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.connections.get(id).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Send a frame to every connection in a text room
    pub async fn send_to_room(
        &self,
        key: RoomKey,
        frame: ServerFrame,
        exclude_user: Option<Snowflake>,
    ) -> usize {
        let connections = self.indexed_connections(&self.room_connections, key);
        self.fan_out(connections, frame, exclude_user).await
    }

    /// Send a frame to every connection in a voice room
    pub async fn send_to_voice_room(
        &self,
        key: RoomKey,
        frame: ServerFrame,
        exclude_user: Option<Snowflake>,
    ) -> usize {
        let connections = self.indexed_connections(&self.voice_connections, key);
        self.fan_out(connections, frame, exclude_user).await
    }

    /// Send a frame to all connections of a user
    pub async fn send_to_user(&self, user_id: Snowflake, frame: ServerFrame) -> usize {
        let connections = self.get_user_connections(user_id);
        self.fan_out(connections, frame, None).await
    }

    /// Send a frame to every connection
    pub async fn broadcast(&self, frame: ServerFrame, exclude_user: Option<Snowflake>) -> usize {
        let connections: Vec<Arc<Connection>> =
            self.connections.iter().map(|r| r.clone()).collect();
        self.fan_out(connections, frame, exclude_user).await
    }

    async fn fan_out(
        &self,
        connections: Vec<Arc<Connection>>,
        frame: ServerFrame,
        exclude_user: Option<Snowflake>,
    ) -> usize {
        let mut sent = 0;

        for conn in connections {
            if exclude_user == Some(conn.user_id()) {
                continue;
            }
            if conn.send(frame.clone()).await.is_ok() {
                sent += 1;
            }
        }

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of distinct connected users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Get the number of text rooms with local members
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }

    /// Clean up connections whose send channel has closed
    pub async fn cleanup_closed_connections(&self) -> usize {
        let closed: Vec<String> = self
            .connections
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.key().clone())
            .collect();

        let count = closed.len();

        for connection_id in closed {
            self.remove_connection(&connection_id).await;
        }

        if count > 0 {
            tracing::info!(count = count, "Cleaned up closed connections");
        }

        count
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}
