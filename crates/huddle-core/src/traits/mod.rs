//! Domain traits (ports)

mod repositories;

pub use repositories::{
    ChannelRepository, MembershipRepository, MessageRepository, PresenceRepository,
    ReactionRepository, RepoResult, ThreadRepository, UserRepository,
};
