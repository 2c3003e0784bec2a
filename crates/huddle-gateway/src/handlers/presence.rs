//! Presence updates
//!
//! Write-through to persistence, then a global broadcast. Presence is
//! intentionally not room-scoped.

use std::sync::Arc;

use huddle_cache::PubSubChannel;

use crate::connection::Connection;
use crate::handlers::{publish_event, HandlerResult};
use crate::protocol::{events, PresenceStatePayload, PresenceUpdatePayload};
use crate::server::GatewayState;

/// Handles `presence.update`
pub struct PresenceHandler;

impl PresenceHandler {
    /// Persist a presence change and broadcast the new state
    pub async fn update(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: PresenceUpdatePayload,
    ) -> HandlerResult<()> {
        let user_id = connection.user_id();

        state
            .repositories()
            .presences
            .upsert(user_id, payload.status)
            .await?;

        publish_event(
            state,
            &PubSubChannel::broadcast(),
            events::PRESENCE_STATE,
            &PresenceStatePayload {
                user_id,
                status: payload.status,
            },
            None,
        )
        .await
    }
}
