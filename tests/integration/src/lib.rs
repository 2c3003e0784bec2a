//! Integration test utilities for the huddle gateway
//!
//! Provides in-memory repositories and an in-memory event bus so the frame
//! router, handlers, and dispatcher can be exercised without PostgreSQL or
//! Redis.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
