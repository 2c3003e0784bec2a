//! # huddle-gateway
//!
//! WebSocket gateway for realtime chat fan-out and voice-room signaling.

pub mod auth;
pub mod connection;
pub mod dispatch;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod voice;
