//! Typed payloads for client events and fan-out views
//!
//! All wire field names are camelCase; snowflake ids travel as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use huddle_core::{Attachment, Message, PresenceStatus, RoomKey, Snowflake};

use super::frames::ProtocolError;

// ============================================================================
// Client payloads
// ============================================================================

/// Room addressed by exactly one of `channelId` / `threadId`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Snowflake>,
}

impl RoomTarget {
    /// Resolve to a room key, requiring exactly one id
    pub fn resolve(&self) -> Result<RoomKey, ProtocolError> {
        match (self.channel_id, self.thread_id) {
            (Some(id), None) => Ok(RoomKey::channel(id)),
            (None, Some(id)) => Ok(RoomKey::thread(id)),
            _ => Err(ProtocolError::InvalidTarget),
        }
    }
}

impl From<RoomKey> for RoomTarget {
    fn from(key: RoomKey) -> Self {
        Self {
            channel_id: key.channel_id(),
            thread_id: key.thread_id(),
        }
    }
}

/// `presence.update` payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    pub status: PresenceStatus,
}

/// Attachment metadata supplied with `message.create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}

/// `message.create` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreatePayload {
    #[serde(flatten)]
    pub target: RoomTarget,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

/// `message.edit` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEditPayload {
    pub message_id: Snowflake,
    pub content: String,
}

/// Payload referencing a single message (`message.delete`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRefPayload {
    pub message_id: Snowflake,
}

/// `reaction.add` / `reaction.remove` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub message_id: Snowflake,
    pub emoji: String,
}

/// `rtc.join` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceJoinPayload {
    #[serde(flatten)]
    pub target: RoomTarget,
    #[serde(default)]
    pub enable_video: bool,
}

/// WebRTC signaling body
///
/// Only the shape is checked at the boundary; SDP and candidate strings
/// are relayed opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalPayload {
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        candidate: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sdp_mid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sdp_m_line_index: Option<u32>,
    },
}

/// `rtc.signal` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSignalPayload {
    #[serde(flatten)]
    pub target: RoomTarget,
    pub target_user_id: Snowflake,
    pub payload: SignalPayload,
}

/// `rtc.media-update` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMediaPayload {
    #[serde(flatten)]
    pub target: RoomTarget,
    pub video_enabled: bool,
}

// ============================================================================
// Server payloads
// ============================================================================

/// `hello` payload, heartbeat interval in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

/// `error` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// `presence.state` broadcast
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStatePayload {
    pub user_id: Snowflake,
    pub status: PresenceStatus,
}

/// `typing` broadcast
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingView {
    pub user_id: Snowflake,
    #[serde(flatten)]
    pub target: RoomTarget,
}

/// Attachment as broadcast with a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: Snowflake,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}

impl From<&Attachment> for AttachmentView {
    fn from(a: &Attachment) -> Self {
        Self {
            id: a.id,
            filename: a.filename.clone(),
            content_type: a.content_type.clone(),
            size: a.size,
            url: a.url.clone(),
        }
    }
}

/// Message row as broadcast in `message.created` / `message.updated`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Snowflake>,
    pub author_id: Snowflake,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub attachments: Vec<AttachmentView>,
}

impl MessageView {
    /// Build the wire view of a message row and its attachments
    #[must_use]
    pub fn new(message: &Message, attachments: &[Attachment]) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            thread_id: message.thread_id,
            author_id: message.author_id,
            content: message.content.clone(),
            created_at: message.created_at,
            edited_at: message.edited_at,
            attachments: attachments.iter().map(AttachmentView::from).collect(),
        }
    }
}

/// `message.deleted` broadcast
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedView {
    pub message_id: Snowflake,
    #[serde(flatten)]
    pub target: RoomTarget,
}

/// `reaction.updated` broadcast, carries the converged count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUpdatedView {
    pub message_id: Snowflake,
    pub emoji: String,
    pub count: i64,
    pub user_id: Snowflake,
}

/// A voice-room participant with their media flag
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantView {
    pub user_id: Snowflake,
    pub video_enabled: bool,
}

/// Unicast reply to `rtc.join`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantsView {
    pub room: String,
    pub participants: Vec<VoiceParticipantView>,
}

/// `rtc.participant-joined` broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantJoinedView {
    pub room: String,
    pub user_id: Snowflake,
    pub video_enabled: bool,
}

/// `rtc.participant-left` broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantLeftView {
    pub room: String,
    pub user_id: Snowflake,
}

/// `rtc.signal` delivery to the target user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSignalView {
    pub room: String,
    pub from_user_id: Snowflake,
    pub payload: SignalPayload,
}

/// `rtc.media-updated` broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMediaUpdatedView {
    pub room: String,
    pub user_id: Snowflake,
    pub video_enabled: bool,
}
