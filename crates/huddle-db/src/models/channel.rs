//! Channel database model

use sqlx::FromRow;

/// Database model for channels table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelModel {
    pub id: i64,
    pub server_id: i64,
    pub kind: String,
    pub name: String,
}
