//! DM thread database model

use sqlx::FromRow;

/// Database model for dm_threads table
#[derive(Debug, Clone, FromRow)]
pub struct ThreadModel {
    pub id: i64,
}
