//! Session records in Redis.
//!
//! Sessions are minted by the HTTP API at login and stored under
//! `session:{session_id}` with the owning user ID as the value. The gateway
//! only reads them: a token is live exactly while its session key exists and
//! still maps to the same user.

use crate::pool::{RedisPool, RedisResult};
use huddle_core::Snowflake;

/// Key prefix for session records
const SESSION_PREFIX: &str = "session:";

/// Read-side store for API-minted sessions
#[derive(Clone)]
pub struct SessionStore {
    pool: RedisPool,
}

impl SessionStore {
    /// Create a new session store
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Generate Redis key for a session
    fn session_key(session_id: &str) -> String {
        format!("{SESSION_PREFIX}{session_id}")
    }

    /// Look up the user a session belongs to
    ///
    /// Returns `None` if the session does not exist, has expired, or holds a
    /// value that is not a user ID.
    pub async fn user_for_session(&self, session_id: &str) -> RedisResult<Option<Snowflake>> {
        let key = Self::session_key(session_id);
        let value = self.pool.get_string(&key).await?;

        Ok(value
            .and_then(|v| v.parse::<i64>().ok())
            .map(Snowflake::new))
    }

    /// Check whether a session is still live
    pub async fn exists(&self, session_id: &str) -> RedisResult<bool> {
        self.pool.exists(&Self::session_key(session_id)).await
    }

    /// Remove a session record
    pub async fn revoke(&self, session_id: &str) -> RedisResult<bool> {
        let deleted = self.pool.delete(&Self::session_key(session_id)).await?;

        if deleted {
            tracing::debug!(session_id = %session_id, "Revoked session");
        }

        Ok(deleted)
    }

    /// Store a session record (used by tests and tooling; the API owns writes)
    pub async fn put(
        &self,
        session_id: &str,
        user_id: Snowflake,
        ttl_seconds: Option<u64>,
    ) -> RedisResult<()> {
        self.pool
            .set_string(
                &Self::session_key(session_id),
                &user_id.to_string(),
                ttl_seconds,
            )
            .await
    }
}
