//! Connection authentication
//!
//! Runs before the WebSocket upgrade. A handshake carries an access token in
//! the `Authorization` header, the `token` query parameter, or the
//! `accessToken` cookie (checked in that order). The token is only good while
//! its session record still exists and maps to the same user.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};

use huddle_cache::SessionStore;
use huddle_common::{AppError, JwtService};
use huddle_core::UserRepository;

use crate::connection::Identity;

/// Extract the access token from a handshake request
///
/// Order: `Authorization: Bearer` header, `token` query parameter,
/// `accessToken` cookie.
pub fn extract_token(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(token) = query.get("token") {
        if !token.is_empty() {
            return Some(token.clone());
        }
    }

    cookie_value(headers, "accessToken")
}

/// Pull a named cookie out of the Cookie header
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() == name && !value.is_empty() {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Validates handshake credentials into an [`Identity`]
pub struct Authenticator {
    jwt: Arc<JwtService>,
    sessions: SessionStore,
    users: Arc<dyn UserRepository>,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(jwt: Arc<JwtService>, sessions: SessionStore, users: Arc<dyn UserRepository>) -> Self {
        Self {
            jwt,
            sessions,
            users,
        }
    }

    /// Authenticate a handshake token
    ///
    /// Verifies the JWT, requires a bound session id, checks the session
    /// record still maps to the token subject, and confirms the user exists.
    /// Any failure rejects the handshake; no connection state is created.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self.jwt.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        let session_id = claims.session_id.ok_or(AppError::InvalidToken)?;

        let session_user = self
            .sessions
            .user_for_session(&session_id)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        if session_user != Some(user_id) {
            tracing::debug!(
                user_id = %user_id,
                session_id = %session_id,
                "Session missing or bound to a different user"
            );
            return Err(AppError::SessionRevoked);
        }

        let user = self.users.find_by_id(user_id).await?;
        if user.is_none() {
            tracing::debug!(user_id = %user_id, "Token subject does not exist");
            return Err(AppError::InvalidToken);
        }

        Ok(Identity {
            user_id,
            session_id,
        })
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
