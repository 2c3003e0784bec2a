//! Wire protocol
//!
//! Every frame on the socket is a JSON envelope `{ "t": ..., "d": ..., "nonce"? }`.
//! Client frames are validated at the boundary; malformed or unknown frames
//! are dropped with a best-effort error frame back to the sender.

mod frames;
mod payloads;

pub mod events;

pub use frames::{ClientEvent, ClientFrame, ProtocolError, ServerFrame};
pub use payloads::{
    AttachmentInput, AttachmentView, ErrorPayload, HelloPayload, MessageCreatePayload,
    MessageDeletedView, MessageEditPayload, MessageRefPayload, MessageView, PresenceStatePayload,
    PresenceUpdatePayload, ReactionPayload, ReactionUpdatedView, RoomTarget, SignalPayload,
    TypingView,
    VoiceJoinPayload, VoiceMediaPayload, VoiceMediaUpdatedView, VoiceParticipantJoinedView,
    VoiceParticipantLeftView, VoiceParticipantView, VoiceParticipantsView, VoiceSignalPayload,
    VoiceSignalView,
};
