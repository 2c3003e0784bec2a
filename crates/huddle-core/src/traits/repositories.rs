//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. The gateway only touches the slices of
//! persistence it needs for authorization checks and message writes.

use async_trait::async_trait;

use crate::entities::{Attachment, Channel, Message, PresenceStatus, Thread, User};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;
}

// ============================================================================
// Channel Repository
// ============================================================================

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find channel by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Channel>>;
}

// ============================================================================
// Thread Repository
// ============================================================================

#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Find DM thread by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Thread>>;

    /// Check if user participates in the thread
    async fn is_participant(&self, thread_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Membership Repository
// ============================================================================

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Check if user is a member of the server
    async fn is_member(&self, server_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID (soft-deleted rows included)
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    /// Create a new message with its attachments
    async fn create(&self, message: &Message, attachments: &[Attachment]) -> RepoResult<()>;

    /// Update message content (edit)
    async fn update_content(&self, message: &Message) -> RepoResult<()>;

    /// Soft delete a message (clears content, keeps the row)
    async fn soft_delete(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Reaction Repository
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Add a reaction, idempotent per (message, user, emoji)
    async fn upsert(&self, message_id: Snowflake, user_id: Snowflake, emoji: &str)
        -> RepoResult<()>;

    /// Remove a reaction
    async fn delete(&self, message_id: Snowflake, user_id: Snowflake, emoji: &str)
        -> RepoResult<()>;

    /// Count reactions with a given emoji on a message
    async fn count(&self, message_id: Snowflake, emoji: &str) -> RepoResult<i64>;
}

// ============================================================================
// Presence Repository
// ============================================================================

#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// Record the latest presence status for a user
    async fn upsert(&self, user_id: Snowflake, status: PresenceStatus) -> RepoResult<()>;
}
