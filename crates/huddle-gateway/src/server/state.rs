//! Gateway state
//!
//! Shared dependencies for the gateway server. Repository handles are trait
//! objects so integration tests can swap in in-memory implementations.

use std::sync::Arc;

use huddle_cache::EventBus;
use huddle_common::HeartbeatConfig;
use huddle_core::{
    ChannelRepository, MembershipRepository, MessageRepository, PresenceRepository,
    ReactionRepository, SnowflakeGenerator, ThreadRepository, UserRepository,
};

use crate::auth::Authenticator;
use crate::connection::ConnectionManager;
use crate::voice::VoiceRegistry;

/// Repository handles used by the gateway
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub presences: Arc<dyn PresenceRepository>,
}

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    repositories: Repositories,
    bus: Arc<dyn EventBus>,
    authenticator: Arc<Authenticator>,
    connection_manager: Arc<ConnectionManager>,
    voice_rooms: Arc<VoiceRegistry>,
    snowflakes: Arc<SnowflakeGenerator>,
    heartbeat: HeartbeatConfig,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        repositories: Repositories,
        bus: Arc<dyn EventBus>,
        authenticator: Arc<Authenticator>,
        connection_manager: Arc<ConnectionManager>,
        voice_rooms: Arc<VoiceRegistry>,
        snowflakes: Arc<SnowflakeGenerator>,
        heartbeat: HeartbeatConfig,
    ) -> Self {
        Self {
            repositories,
            bus,
            authenticator,
            connection_manager,
            voice_rooms,
            snowflakes,
            heartbeat,
        }
    }

    /// Get the repository bundle
    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    /// Get the event bus
    pub fn bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// Get the handshake authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.connection_manager
    }

    /// Get the voice room registry
    pub fn voice_rooms(&self) -> &VoiceRegistry {
        &self.voice_rooms
    }

    /// Get the snowflake generator
    pub fn snowflakes(&self) -> &SnowflakeGenerator {
        &self.snowflakes
    }

    /// Get the heartbeat timing configuration
    pub fn heartbeat(&self) -> &HeartbeatConfig {
        &self.heartbeat
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("voice_rooms", &self.voice_rooms)
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}
