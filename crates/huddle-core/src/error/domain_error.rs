//! Domain-level failures
//!
//! Every variant carries a stable code that goes out on gateway error
//! frames; clients are expected to branch on the code, not the message.

use thiserror::Error;

use crate::value_objects::Snowflake;

#[derive(Debug, Error)]
pub enum DomainError {
    // Unknown entities
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Thread not found: {0}")]
    ThreadNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // Rejected input
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Message must have content or attachments")]
    EmptyMessage,

    // Missing eligibility
    #[error("Not a member of this server")]
    NotServerMember,

    #[error("Not a participant of this thread")]
    NotThreadParticipant,

    #[error("Not message author")]
    NotMessageAuthor,

    #[error("Channel {0} is not a voice channel")]
    NotVoiceChannel(Snowflake),

    #[error("Cannot send messages in this channel")]
    CannotSendMessages,

    // Infrastructure failures surfaced through the domain
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable code for gateway error frames
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::ThreadNotFound(_) => "UNKNOWN_THREAD",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::NotServerMember => "NOT_SERVER_MEMBER",
            Self::NotThreadParticipant => "NOT_THREAD_PARTICIPANT",
            Self::NotMessageAuthor => "NOT_MESSAGE_AUTHOR",
            Self::NotVoiceChannel(_) => "NOT_VOICE_CHANNEL",
            Self::CannotSendMessages => "CANNOT_SEND_MESSAGES",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}
