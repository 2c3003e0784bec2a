//! # huddle-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for the repository traits
//! defined in `huddle-core`. It handles:
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_db::pool::{create_pool, DatabaseConfig};
//! use huddle_db::repositories::PgMessageRepository;
//! use huddle_core::traits::MessageRepository;
//!
//! async fn example(app: &huddle_common::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_config(&app.database);
//!     let pool = create_pool(&config).await?;
//!     let message_repo = PgMessageRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{
    PgChannelRepository, PgMembershipRepository, PgMessageRepository, PgPresenceRepository,
    PgReactionRepository, PgThreadRepository, PgUserRepository,
};
