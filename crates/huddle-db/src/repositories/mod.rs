//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in huddle-core.
//! Each repository handles database operations for a specific domain entity.

mod channel;
mod error;
mod membership;
mod message;
mod presence;
mod reaction;
mod thread;
mod user;

pub use channel::PgChannelRepository;
pub use membership::PgMembershipRepository;
pub use message::PgMessageRepository;
pub use presence::PgPresenceRepository;
pub use reaction::PgReactionRepository;
pub use thread::PgThreadRepository;
pub use user::PgUserRepository;
