//! Message entity - represents a chat message in a channel or DM thread

use chrono::{DateTime, Utc};

use crate::value_objects::{RoomKey, Snowflake};

/// Message entity
///
/// Exactly one of `channel_id` / `thread_id` is set; it identifies the room
/// the message belongs to. Deleted messages keep their row with `deleted_at`
/// set and content cleared (soft delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub thread_id: Option<Snowflake>,
    pub author_id: Snowflake,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new message in the given room
    pub fn new(id: Snowflake, room: RoomKey, author_id: Snowflake, content: Option<String>) -> Self {
        Self {
            id,
            channel_id: room.channel_id(),
            thread_id: room.thread_id(),
            author_id,
            content,
            created_at: Utc::now(),
            edited_at: None,
            deleted_at: None,
        }
    }

    /// The room this message belongs to, if the row is well-formed
    pub fn room_key(&self) -> Option<RoomKey> {
        match (self.channel_id, self.thread_id) {
            (Some(id), None) => Some(RoomKey::Channel(id)),
            (None, Some(id)) => Some(RoomKey::Thread(id)),
            _ => None,
        }
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Check if message has been soft-deleted
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Edit the message content
    pub fn edit(&mut self, content: String) {
        self.content = Some(content);
        self.edited_at = Some(Utc::now());
    }

    /// Soft-delete the message (clears content, keeps the row)
    pub fn soft_delete(&mut self) {
        self.content = None;
        self.deleted_at = Some(Utc::now());
    }
}

/// Attachment entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: Snowflake,
    pub message_id: Snowflake,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}

impl Attachment {
    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}
