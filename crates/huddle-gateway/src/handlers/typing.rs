//! Typing indicators
//!
//! Transient: never persisted, never de-duplicated. Delivered to the target
//! room only, excluding the sender.

use std::sync::Arc;

use huddle_cache::PubSubChannel;

use crate::connection::Connection;
use crate::handlers::{publish_event, HandlerResult};
use crate::protocol::{events, RoomTarget, TypingView};
use crate::server::GatewayState;

/// Handles `typing.start`
pub struct TypingHandler;

impl TypingHandler {
    /// Broadcast a typing indicator to the rest of the room
    ///
    /// Dropped silently when the sender has not joined the room.
    pub async fn start(
        state: &GatewayState,
        connection: &Arc<Connection>,
        target: RoomTarget,
    ) -> HandlerResult<()> {
        let room = target.resolve()?;

        if !connection.in_room(room).await {
            tracing::trace!(
                connection_id = %connection.connection_id(),
                room = %room,
                "Typing event for a room the sender has not joined, dropped"
            );
            return Ok(());
        }

        publish_event(
            state,
            &PubSubChannel::room(room),
            events::TYPING,
            &TypingView {
                user_id: connection.user_id(),
                target: room.into(),
            },
            Some(connection.user_id()),
        )
        .await
    }
}
