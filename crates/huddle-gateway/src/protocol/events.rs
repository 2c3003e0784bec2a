//! Event type names used on the wire and on the event bus

// Session lifecycle
pub const HELLO: &str = "hello";
pub const HEARTBEAT_ACK: &str = "heartbeat.ack";
pub const ERROR: &str = "error";
pub const ACK: &str = "ack";

// Fan-out events
pub const MESSAGE_CREATED: &str = "message.created";
pub const MESSAGE_UPDATED: &str = "message.updated";
pub const MESSAGE_DELETED: &str = "message.deleted";
pub const REACTION_UPDATED: &str = "reaction.updated";
pub const PRESENCE_STATE: &str = "presence.state";
pub const TYPING: &str = "typing";

// Voice signaling events
pub const RTC_PARTICIPANTS: &str = "rtc.participants";
pub const RTC_PARTICIPANT_JOINED: &str = "rtc.participant-joined";
pub const RTC_PARTICIPANT_LEFT: &str = "rtc.participant-left";
pub const RTC_SIGNAL: &str = "rtc.signal";
pub const RTC_MEDIA_UPDATED: &str = "rtc.media-updated";
