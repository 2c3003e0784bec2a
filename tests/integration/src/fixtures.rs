//! In-memory test doubles
//!
//! In-memory implementations of the repository traits and the event bus.
//! All of them record enough state for tests to assert on persistence and
//! fan-out without any external services.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use huddle_cache::{BusResult, EventBus, PubSubChannel, PubSubEvent, ReceivedMessage};
use huddle_core::{
    Attachment, Channel, ChannelRepository, MembershipRepository, Message, MessageRepository,
    PresenceRepository, PresenceStatus, ReactionRepository, RepoResult, Snowflake, Thread,
    ThreadRepository, User, UserRepository,
};

// ============================================================================
// Event bus
// ============================================================================

/// One recorded publish call
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub channel: PubSubChannel,
    pub event: PubSubEvent,
}

/// In-memory event bus
///
/// Records every publish for assertions and forwards it to the broadcast
/// receiver, so a running dispatcher sees the same traffic it would see from
/// Redis. Subscriptions are tracked by channel name.
pub struct MemoryEventBus {
    published: Mutex<Vec<PublishedEvent>>,
    subscribed: Mutex<HashSet<String>>,
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
}

impl MemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        Self {
            published: Mutex::new(Vec::new()),
            subscribed: Mutex::new(HashSet::new()),
            broadcast_tx,
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every publish recorded so far, in order
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().clone()
    }

    /// Recorded publishes with a given event type
    pub fn published_of(&self, event_type: &str) -> Vec<PublishedEvent> {
        self.published
            .lock()
            .iter()
            .filter(|p| p.event.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Check whether a channel name is currently subscribed
    pub fn is_subscribed(&self, name: &str) -> bool {
        self.subscribed.lock().contains(name)
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> BusResult<()> {
        self.published.lock().push(PublishedEvent {
            channel: channel.clone(),
            event: event.clone(),
        });

        let payload = event.to_json().unwrap_or_default();
        // No receivers is fine
        let _ = self.broadcast_tx.send(ReceivedMessage {
            channel: channel.clone(),
            event: Some(event.clone()),
            payload,
        });

        Ok(())
    }

    async fn subscribe(&self, channels: &[PubSubChannel]) -> BusResult<()> {
        let mut subscribed = self.subscribed.lock();
        for channel in channels {
            subscribed.insert(channel.name());
        }
        Ok(())
    }

    async fn unsubscribe(&self, channels: &[PubSubChannel]) -> BusResult<()> {
        let mut subscribed = self.subscribed.lock();
        for channel in channels {
            subscribed.remove(&channel.name());
        }
        Ok(())
    }

    fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }
}

// ============================================================================
// Repositories
// ============================================================================

/// In-memory user rows
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<HashMap<Snowflake, User>>,
}

impl MemoryUsers {
    pub fn insert(&self, user: User) {
        self.rows.lock().insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        Ok(self.rows.lock().get(&id).cloned())
    }
}

/// In-memory channel rows
#[derive(Default)]
pub struct MemoryChannels {
    rows: Mutex<HashMap<Snowflake, Channel>>,
}

impl MemoryChannels {
    pub fn insert(&self, channel: Channel) {
        self.rows.lock().insert(channel.id, channel);
    }
}

#[async_trait]
impl ChannelRepository for MemoryChannels {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Channel>> {
        Ok(self.rows.lock().get(&id).cloned())
    }
}

/// In-memory DM threads and their participant sets
#[derive(Default)]
pub struct MemoryThreads {
    threads: Mutex<HashSet<Snowflake>>,
    participants: Mutex<HashSet<(Snowflake, Snowflake)>>,
}

impl MemoryThreads {
    pub fn insert(&self, thread_id: Snowflake, participants: &[Snowflake]) {
        self.threads.lock().insert(thread_id);
        let mut set = self.participants.lock();
        for user_id in participants {
            set.insert((thread_id, *user_id));
        }
    }
}

#[async_trait]
impl ThreadRepository for MemoryThreads {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Thread>> {
        Ok(self.threads.lock().contains(&id).then_some(Thread { id }))
    }

    async fn is_participant(&self, thread_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.participants.lock().contains(&(thread_id, user_id)))
    }
}

/// In-memory server membership pairs
#[derive(Default)]
pub struct MemoryMemberships {
    rows: Mutex<HashSet<(Snowflake, Snowflake)>>,
}

impl MemoryMemberships {
    pub fn insert(&self, server_id: Snowflake, user_id: Snowflake) {
        self.rows.lock().insert((server_id, user_id));
    }
}

#[async_trait]
impl MembershipRepository for MemoryMemberships {
    async fn is_member(&self, server_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.rows.lock().contains(&(server_id, user_id)))
    }
}

/// In-memory message rows with their attachments
#[derive(Default)]
pub struct MemoryMessages {
    rows: Mutex<HashMap<Snowflake, (Message, Vec<Attachment>)>>,
}

impl MemoryMessages {
    /// Seed a message row directly
    pub fn insert(&self, message: Message) {
        self.rows.lock().insert(message.id, (message, Vec::new()));
    }

    /// Read a stored message row
    pub fn get(&self, id: Snowflake) -> Option<Message> {
        self.rows.lock().get(&id).map(|(m, _)| m.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessages {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        Ok(self.rows.lock().get(&id).map(|(m, _)| m.clone()))
    }

    async fn create(&self, message: &Message, attachments: &[Attachment]) -> RepoResult<()> {
        self.rows
            .lock()
            .insert(message.id, (message.clone(), attachments.to_vec()));
        Ok(())
    }

    async fn update_content(&self, message: &Message) -> RepoResult<()> {
        if let Some((row, _)) = self.rows.lock().get_mut(&message.id) {
            row.content = message.content.clone();
            row.edited_at = message.edited_at;
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Snowflake) -> RepoResult<()> {
        if let Some((row, _)) = self.rows.lock().get_mut(&id) {
            row.soft_delete();
        }
        Ok(())
    }
}

/// In-memory reaction triples
#[derive(Default)]
pub struct MemoryReactions {
    rows: Mutex<HashSet<(Snowflake, Snowflake, String)>>,
}

#[async_trait]
impl ReactionRepository for MemoryReactions {
    async fn upsert(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<()> {
        self.rows
            .lock()
            .insert((message_id, user_id, emoji.to_string()));
        Ok(())
    }

    async fn delete(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<()> {
        self.rows
            .lock()
            .remove(&(message_id, user_id, emoji.to_string()));
        Ok(())
    }

    async fn count(&self, message_id: Snowflake, emoji: &str) -> RepoResult<i64> {
        let count = self
            .rows
            .lock()
            .iter()
            .filter(|(m, _, e)| *m == message_id && e == emoji)
            .count();
        Ok(count as i64)
    }
}

/// In-memory presence table
#[derive(Default)]
pub struct MemoryPresences {
    rows: Mutex<HashMap<Snowflake, PresenceStatus>>,
}

impl MemoryPresences {
    /// Last stored status for a user
    pub fn status_of(&self, user_id: Snowflake) -> Option<PresenceStatus> {
        self.rows.lock().get(&user_id).copied()
    }
}

#[async_trait]
impl PresenceRepository for MemoryPresences {
    async fn upsert(&self, user_id: Snowflake, status: PresenceStatus) -> RepoResult<()> {
        self.rows.lock().insert(user_id, status);
        Ok(())
    }
}
