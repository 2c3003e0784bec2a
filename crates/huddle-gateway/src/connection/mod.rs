//! WebSocket connection tracking

mod connection;
mod manager;

pub use connection::{Connection, Identity, SendError};
pub use manager::ConnectionManager;
