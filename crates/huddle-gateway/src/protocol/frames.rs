//! Frame envelope and typed client events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events;
use super::payloads::{
    ErrorPayload, HelloPayload, MessageCreatePayload, MessageEditPayload, MessageRefPayload,
    PresenceUpdatePayload, ReactionPayload, RoomTarget, VoiceJoinPayload, VoiceMediaPayload,
    VoiceSignalPayload,
};

/// Errors produced while decoding a client frame
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error("Exactly one of channelId / threadId must be set")]
    InvalidTarget,

    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}

/// Frame sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Event type
    pub t: String,

    /// Event payload
    #[serde(default)]
    pub d: Value,

    /// Opaque correlation id echoed back in acks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl ClientFrame {
    /// Deserialize from JSON text
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse the payload into a typed event
    pub fn into_event(self) -> Result<ClientEvent, ProtocolError> {
        fn payload<T: serde::de::DeserializeOwned>(
            event: &str,
            d: Value,
        ) -> Result<T, ProtocolError> {
            serde_json::from_value(d).map_err(|e| ProtocolError::InvalidPayload {
                event: event.to_string(),
                reason: e.to_string(),
            })
        }

        let event = match self.t.as_str() {
            "heartbeat" => ClientEvent::Heartbeat,
            "channel.join" => ClientEvent::RoomJoin(payload(&self.t, self.d)?),
            "channel.leave" => ClientEvent::RoomLeave(payload(&self.t, self.d)?),
            "presence.update" => ClientEvent::PresenceUpdate(payload(&self.t, self.d)?),
            "typing.start" => ClientEvent::TypingStart(payload(&self.t, self.d)?),
            "message.create" => ClientEvent::MessageCreate(payload(&self.t, self.d)?),
            "message.edit" => ClientEvent::MessageEdit(payload(&self.t, self.d)?),
            "message.delete" => ClientEvent::MessageDelete(payload(&self.t, self.d)?),
            "reaction.add" => ClientEvent::ReactionAdd(payload(&self.t, self.d)?),
            "reaction.remove" => ClientEvent::ReactionRemove(payload(&self.t, self.d)?),
            "rtc.join" => ClientEvent::VoiceJoin(payload(&self.t, self.d)?),
            "rtc.leave" => ClientEvent::VoiceLeave(payload(&self.t, self.d)?),
            "rtc.signal" => ClientEvent::VoiceSignal(payload(&self.t, self.d)?),
            "rtc.media-update" => ClientEvent::VoiceMediaUpdate(payload(&self.t, self.d)?),
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }
}

/// Typed client event after payload validation
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Heartbeat,
    RoomJoin(RoomTarget),
    RoomLeave(RoomTarget),
    PresenceUpdate(PresenceUpdatePayload),
    TypingStart(RoomTarget),
    MessageCreate(MessageCreatePayload),
    MessageEdit(MessageEditPayload),
    MessageDelete(MessageRefPayload),
    ReactionAdd(ReactionPayload),
    ReactionRemove(ReactionPayload),
    VoiceJoin(VoiceJoinPayload),
    VoiceLeave(RoomTarget),
    VoiceSignal(VoiceSignalPayload),
    VoiceMediaUpdate(VoiceMediaPayload),
}

/// Frame sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    /// Event type
    pub t: String,

    /// Event payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,

    /// Correlation id, present on acks and nonce'd errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl ServerFrame {
    /// Create a dispatch frame for an arbitrary event
    #[must_use]
    pub fn event(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            t: event_type.into(),
            d: Some(data),
            nonce: None,
        }
    }

    /// Create the post-upgrade hello frame
    #[must_use]
    pub fn hello(heartbeat_interval_ms: u64) -> Self {
        Self::event(
            events::HELLO,
            serde_json::to_value(HelloPayload {
                heartbeat_interval: heartbeat_interval_ms,
            })
            .unwrap_or_default(),
        )
    }

    /// Create a heartbeat acknowledgement frame
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            t: events::HEARTBEAT_ACK.to_string(),
            d: None,
            nonce: None,
        }
    }

    /// Create an error frame for the invoking connection
    #[must_use]
    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        nonce: Option<String>,
    ) -> Self {
        Self {
            t: events::ERROR.to_string(),
            d: Some(
                serde_json::to_value(ErrorPayload {
                    code: code.into(),
                    message: message.into(),
                })
                .unwrap_or_default(),
            ),
            nonce,
        }
    }

    /// Create an ack frame carrying the operation result
    #[must_use]
    pub fn ack(nonce: String, data: Value) -> Self {
        Self {
            t: events::ACK.to_string(),
            d: Some(data),
            nonce: Some(nonce),
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl std::fmt::Display for ServerFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServerFrame(t={})", self.t)
    }
}
