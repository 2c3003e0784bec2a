//! Pooled Redis connections via deadpool-redis
//!
//! The pool is lazy: building it never touches the network, connections are
//! opened on first checkout.

use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

/// Redis pool settings
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl From<&huddle_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &huddle_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
        }
    }
}

/// Errors from pool construction and Redis commands
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("failed to build Redis pool: {0}")]
    CreatePool(String),

    #[error("failed to check out a Redis connection: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Shared handle to the Redis connection pool
///
/// Cloning is cheap; all clones draw from the same pool.
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        // Keep credentials out of the logs
        let display_url = config.url.split('@').next_back().unwrap_or(&config.url);
        tracing::info!(
            url = %display_url,
            max_connections = config.max_connections,
            "Redis pool ready"
        );

        Ok(Self { pool })
    }

    /// Check a connection out of the pool
    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// GET a string value
    pub async fn get_string(&self, key: &str) -> RedisResult<Option<String>> {
        Ok(self.get().await?.get(key).await?)
    }

    /// SET a string value, with SETEX semantics when a TTL is given
    pub async fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> RedisResult<()> {
        let mut conn = self.get().await?;
        if let Some(ttl) = ttl_seconds {
            conn.set_ex::<_, _, ()>(key, value, ttl).await?;
        } else {
            conn.set::<_, _, ()>(key, value).await?;
        }
        Ok(())
    }

    /// DEL a key, reporting whether it existed
    pub async fn delete(&self, key: &str) -> RedisResult<bool> {
        let removed: i32 = self.get().await?.del(key).await?;
        Ok(removed > 0)
    }

    /// EXISTS check for a key
    pub async fn exists(&self, key: &str) -> RedisResult<bool> {
        Ok(self.get().await?.exists(key).await?)
    }
}
