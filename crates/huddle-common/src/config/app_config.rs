//! Application configuration
//!
//! Loaded from environment variables, one section per subsystem. A `.env`
//! file is honored in development.

use serde::Deserialize;
use std::env;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn parsed_or<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

/// Top-level configuration tree
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub heartbeat: HeartbeatConfig,
    pub snowflake: SnowflakeConfig,
}

impl AppConfig {
    /// Load every section from the environment
    ///
    /// # Errors
    /// Returns an error if a required variable is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings::from_env(),
            gateway: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            heartbeat: HeartbeatConfig::from_env(),
            snowflake: SnowflakeConfig::from_env(),
        })
    }
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl AppSettings {
    fn from_env() -> Self {
        Self {
            name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
            env: env::var("APP_ENV")
                .ok()
                .and_then(|s| Environment::parse(&s))
                .unwrap_or_default(),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Listen address for the gateway server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_port = required("GATEWAY_PORT")?;
        let port = raw_port
            .parse()
            .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT", raw_port.clone()))?;

        Ok(Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
            port,
        })
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", default_db_max_connections()),
            min_connections: parsed_or("DATABASE_MIN_CONNECTIONS", default_db_min_connections()),
        })
    }
}

/// Redis settings, shared by the session store and the event bus
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("REDIS_URL")?,
            max_connections: parsed_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections()),
        })
    }
}

/// Token verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required("JWT_SECRET")?,
            access_token_expiry: parsed_or("JWT_ACCESS_TOKEN_EXPIRY", default_access_token_expiry()),
        })
    }
}

/// Heartbeat timing for gateway connections
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    /// Interval the client is told to send heartbeats at, in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
    /// A connection silent for this long is closed, in seconds
    #[serde(default = "default_client_timeout")]
    pub client_timeout_secs: u64,
}

impl HeartbeatConfig {
    fn from_env() -> Self {
        Self {
            interval_secs: parsed_or("HEARTBEAT_INTERVAL_SECS", default_heartbeat_interval()),
            client_timeout_secs: parsed_or(
                "HEARTBEAT_CLIENT_TIMEOUT_SECS",
                default_client_timeout(),
            ),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_heartbeat_interval(),
            client_timeout_secs: default_client_timeout(),
        }
    }
}

/// Snowflake generator settings
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

impl SnowflakeConfig {
    fn from_env() -> Self {
        Self {
            worker_id: parsed_or("WORKER_ID", 0),
        }
    }
}

fn default_app_name() -> String {
    "huddle-gateway".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_db_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_heartbeat_interval() -> u64 {
    45
}

fn default_client_timeout() -> u64 {
    90
}
