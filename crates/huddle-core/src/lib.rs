//! # huddle-core
//!
//! Domain layer for the huddle realtime gateway: entities, value objects,
//! and the repository traits the gateway uses to talk to the persistence
//! gateway. This crate has zero dependencies on infrastructure (database,
//! web framework, Redis, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Channel, ChannelKind, Message, Presence, PresenceStatus, Reaction, Thread, User,
};
pub use error::DomainError;
pub use traits::{
    ChannelRepository, MembershipRepository, MessageRepository, PresenceRepository,
    ReactionRepository, RepoResult, ThreadRepository, UserRepository,
};
pub use value_objects::{RoomKey, RoomKeyParseError, Snowflake, SnowflakeGenerator, SnowflakeParseError};
