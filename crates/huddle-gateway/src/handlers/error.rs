//! Handler error types

use thiserror::Error;

use huddle_cache::BusError;
use huddle_core::DomainError;

use crate::protocol::ProtocolError;

/// Errors raised while handling a client event
///
/// These never close the connection: the router turns them into a
/// best-effort `error` frame for the invoking connection only.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or unknown client frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Domain rule violation or persistence failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Event bus publish/subscribe failure
    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Error code carried in the `error` frame
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "INVALID_PAYLOAD",
            Self::Domain(e) => e.code(),
            Self::Bus(_) => "EVENT_BUS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
