//! # huddle-cache
//!
//! Redis layer for session validation and cross-instance pub/sub fan-out.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Session Store**: Reads the session records minted by the HTTP API
//! - **Pub/Sub**: Real-time event distribution across gateway instances
//!
//! ## Example
//!
//! ```ignore
//! use huddle_cache::{RedisPool, RedisPoolConfig, SessionStore, Publisher};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//!
//! let sessions = SessionStore::new(pool.clone());
//! let user_id = sessions.user_for_session("sess-abc").await?;
//!
//! let publisher = Publisher::new(pool.clone());
//! let event = PubSubEvent::new("message.created", data);
//! publisher.publish(&PubSubChannel::room(room_key), &event).await?;
//! ```

pub mod pool;
pub mod pubsub;
pub mod session;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export session types
pub use session::SessionStore;

// Re-export pubsub types
pub use pubsub::{
    BusError, BusResult, EventBus, PubSubChannel, PubSubEvent, Publisher, ReceivedMessage,
    RedisEventBus, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
    BROADCAST_CHANNEL, USER_CHANNEL_PREFIX, VOICE_CHANNEL_PREFIX,
};
