//! Redis pub/sub plumbing

mod bus;
mod channels;
mod publisher;
mod subscriber;

pub use bus::{BusError, BusResult, EventBus, RedisEventBus};
pub use channels::{
    PubSubChannel, BROADCAST_CHANNEL, USER_CHANNEL_PREFIX, VOICE_CHANNEL_PREFIX,
};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
};
