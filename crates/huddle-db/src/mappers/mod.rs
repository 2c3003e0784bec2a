//! Entity ↔ model mappers

mod channel;
mod message;
mod thread;
mod user;
