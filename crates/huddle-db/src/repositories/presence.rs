//! PostgreSQL implementation of PresenceRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use huddle_core::entities::PresenceStatus;
use huddle_core::traits::{PresenceRepository, RepoResult};
use huddle_core::value_objects::Snowflake;

use super::error::map_db_error;

/// PostgreSQL implementation of PresenceRepository
#[derive(Clone)]
pub struct PgPresenceRepository {
    pool: PgPool,
}

impl PgPresenceRepository {
    /// Create a new PgPresenceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceRepository for PgPresenceRepository {
    #[instrument(skip(self))]
    async fn upsert(&self, user_id: Snowflake, status: PresenceStatus) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO presences (user_id, status, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET status = $2, updated_at = NOW()
            "#,
        )
        .bind(user_id.into_inner())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
