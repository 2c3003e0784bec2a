//! Database models with SQLx `FromRow` derives

mod channel;
mod message;
mod thread;
mod user;

pub use channel::ChannelModel;
pub use message::{AttachmentModel, MessageModel};
pub use thread::ThreadModel;
pub use user::UserModel;
