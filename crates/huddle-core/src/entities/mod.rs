//! Domain entities - core business objects

mod channel;
mod message;
mod presence;
mod reaction;
mod thread;
mod user;

pub use channel::{Channel, ChannelKind};
pub use message::{Attachment, Message};
pub use presence::{Presence, PresenceStatus};
pub use reaction::Reaction;
pub use thread::Thread;
pub use user::User;
