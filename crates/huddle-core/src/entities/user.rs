//! User entity

use crate::value_objects::Snowflake;

/// User entity (the slice of the row the gateway reads)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
}
