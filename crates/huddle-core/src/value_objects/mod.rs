//! Value objects - immutable domain identifiers

mod room_key;
mod snowflake;

pub use room_key::{RoomKey, RoomKeyParseError};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
