//! Voice room coordination
//!
//! Voice rosters are process-local and ephemeral; nothing here is persisted.
//! Notifications still travel through the event bus under the `voice:`
//! namespace so delivery shares the text fan-out path.

mod coordinator;
mod registry;

pub use coordinator::VoiceCoordinator;
pub use registry::{VoiceJoinOutcome, VoiceRegistry};
