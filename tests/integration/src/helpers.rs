//! Test harness for gateway handler tests
//!
//! Wires a full `GatewayState` over the in-memory fixtures, with helpers for
//! seeding rows, attaching connections, and routing raw client frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use huddle_cache::{RedisPool, RedisPoolConfig, SessionStore};
use huddle_common::{HeartbeatConfig, JwtService};
use huddle_core::{
    Channel, ChannelKind, Message, PresenceStatus, RoomKey, Snowflake, SnowflakeGenerator, User,
};
use huddle_gateway::auth::Authenticator;
use huddle_gateway::connection::{Connection, ConnectionManager, Identity};
use huddle_gateway::handlers::FrameRouter;
use huddle_gateway::protocol::{ClientFrame, ServerFrame};
use huddle_gateway::server::{GatewayState, Repositories};
use huddle_gateway::voice::VoiceRegistry;

use crate::fixtures::{
    MemoryChannels, MemoryEventBus, MemoryMemberships, MemoryMessages, MemoryPresences,
    MemoryReactions, MemoryThreads, MemoryUsers,
};

/// JWT secret shared by every harness instance
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-long-enough";

/// Buffer size of each test connection's outgoing frame channel
const FRAME_BUFFER: usize = 64;

/// A gateway state backed entirely by in-memory fixtures
///
/// The session store rides on a lazy Redis pool that never connects; tests
/// that need handshake authentication only exercise the paths that fail
/// before the session lookup.
pub struct TestHarness {
    pub state: GatewayState,
    pub bus: Arc<MemoryEventBus>,
    pub users: Arc<MemoryUsers>,
    pub channels: Arc<MemoryChannels>,
    pub threads: Arc<MemoryThreads>,
    pub memberships: Arc<MemoryMemberships>,
    pub messages: Arc<MemoryMessages>,
    pub reactions: Arc<MemoryReactions>,
    pub presences: Arc<MemoryPresences>,
    next_connection: AtomicU64,
}

impl TestHarness {
    #[must_use]
    pub fn new() -> Self {
        let users = Arc::new(MemoryUsers::default());
        let channels = Arc::new(MemoryChannels::default());
        let threads = Arc::new(MemoryThreads::default());
        let memberships = Arc::new(MemoryMemberships::default());
        let messages = Arc::new(MemoryMessages::default());
        let reactions = Arc::new(MemoryReactions::default());
        let presences = Arc::new(MemoryPresences::default());

        let repositories = Repositories {
            users: users.clone(),
            channels: channels.clone(),
            threads: threads.clone(),
            memberships: memberships.clone(),
            messages: messages.clone(),
            reactions: reactions.clone(),
            presences: presences.clone(),
        };

        let bus = MemoryEventBus::new_shared();

        let jwt = Arc::new(JwtService::new(TEST_JWT_SECRET, 900));
        let sessions = SessionStore::new(
            RedisPool::new(RedisPoolConfig::default()).expect("lazy pool creation"),
        );
        let authenticator = Arc::new(Authenticator::new(
            jwt,
            sessions,
            repositories.users.clone(),
        ));

        let state = GatewayState::new(
            repositories,
            bus.clone(),
            authenticator,
            ConnectionManager::new_shared(),
            VoiceRegistry::new_shared(),
            Arc::new(SnowflakeGenerator::new(0)),
            HeartbeatConfig::default(),
        );

        Self {
            state,
            bus,
            users,
            channels,
            threads,
            memberships,
            messages,
            reactions,
            presences,
            next_connection: AtomicU64::new(1),
        }
    }

    /// Attach a connection for a user, as if the handshake already passed
    pub fn connect(&self, user_id: i64) -> (Arc<Connection>, mpsc::Receiver<ServerFrame>) {
        let n = self.next_connection.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);

        let connection = Connection::new(
            format!("conn-{n}"),
            Identity {
                user_id: Snowflake::new(user_id),
                session_id: format!("sess-{n}"),
            },
            tx,
        );
        self.state.connection_manager().add_connection(connection.clone());

        (connection, rx)
    }

    /// Route a raw client frame through the frame router
    ///
    /// # Panics
    /// Panics if `json` is not a valid frame envelope.
    pub async fn route(&self, connection: &Arc<Connection>, json: &str) {
        let frame = ClientFrame::from_json(json).expect("valid frame json");
        FrameRouter::route(&self.state, connection, frame).await;
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub fn seed_user(&self, id: i64, username: &str) -> Snowflake {
        let id = Snowflake::new(id);
        self.users.insert(User {
            id,
            username: username.to_string(),
        });
        id
    }

    pub fn seed_text_channel(&self, id: i64, server_id: i64) -> RoomKey {
        self.seed_channel(id, server_id, ChannelKind::Text)
    }

    pub fn seed_voice_channel(&self, id: i64, server_id: i64) -> RoomKey {
        self.seed_channel(id, server_id, ChannelKind::Voice)
    }

    fn seed_channel(&self, id: i64, server_id: i64, kind: ChannelKind) -> RoomKey {
        let id = Snowflake::new(id);
        self.channels.insert(Channel {
            id,
            server_id: Snowflake::new(server_id),
            kind,
            name: format!("room-{id}"),
        });
        RoomKey::channel(id)
    }

    pub fn seed_member(&self, server_id: i64, user_id: i64) {
        self.memberships
            .insert(Snowflake::new(server_id), Snowflake::new(user_id));
    }

    pub fn seed_thread(&self, id: i64, participants: &[i64]) -> RoomKey {
        let id = Snowflake::new(id);
        let participants: Vec<Snowflake> =
            participants.iter().copied().map(Snowflake::new).collect();
        self.threads.insert(id, &participants);
        RoomKey::thread(id)
    }

    pub fn seed_message(&self, id: i64, channel_id: i64, author_id: i64, content: &str) -> Snowflake {
        let id = Snowflake::new(id);
        self.messages.insert(Message::new(
            id,
            RoomKey::channel(Snowflake::new(channel_id)),
            Snowflake::new(author_id),
            Some(content.to_string()),
        ));
        id
    }

    /// Last persisted presence for a user
    pub fn presence_of(&self, user_id: i64) -> Option<PresenceStatus> {
        self.presences.status_of(Snowflake::new(user_id))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------
// Frame assertions
// ----------------------------------------------------------------------

/// Pop the next frame a connection received, if any
pub fn try_frame(rx: &mut mpsc::Receiver<ServerFrame>) -> Option<ServerFrame> {
    rx.try_recv().ok()
}

/// Pop the next frame and assert its event type
///
/// # Panics
/// Panics if no frame is pending or the type differs.
pub fn expect_frame(rx: &mut mpsc::Receiver<ServerFrame>, event_type: &str) -> ServerFrame {
    let frame = try_frame(rx)
        .unwrap_or_else(|| panic!("expected a `{event_type}` frame but none was pending"));
    assert_eq!(frame.t, event_type, "unexpected frame type");
    frame
}

/// Extract the `code` field of an error frame payload
pub fn frame_code(frame: &ServerFrame) -> Option<String> {
    frame
        .d
        .as_ref()
        .and_then(|d| d.get("code"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
