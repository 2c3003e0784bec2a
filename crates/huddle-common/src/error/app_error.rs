//! Application-level errors
//!
//! Failures surfaced outside a single connection's frame loop: handshake
//! rejection, startup wiring, and infrastructure faults. Per-event errors
//! on an established connection are handled by the gateway's frame-level
//! error type instead.

use serde::Serialize;

use huddle_core::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Handshake rejections; all map to a 401 before the WebSocket upgrade
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Session revoked")]
    SessionRevoked,

    // Infrastructure faults
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for client-facing responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingAuth => "MISSING_AUTH",
            Self::SessionRevoked => "SESSION_REVOKED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can fix this by re-authenticating
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::TokenExpired | Self::MissingAuth | Self::SessionRevoked
        )
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DatabaseError(msg) => Self::Database(msg),
            DomainError::CacheError(msg) => Self::Cache(msg),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Body of an HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
