//! Text room join/leave
//!
//! Joins subscribe the process to the room topic on the event bus; the last
//! local leave unsubscribes it.

use std::sync::Arc;

use huddle_cache::PubSubChannel;

use crate::connection::Connection;
use crate::handlers::{eligibility, HandlerResult};
use crate::protocol::{RoomTarget, ServerFrame};
use crate::server::GatewayState;

/// Handles `channel.join` / `channel.leave`
pub struct RoomHandler;

impl RoomHandler {
    /// Subscribe a connection to a text room
    ///
    /// Idempotent; ineligible joins are rejected with an error frame.
    pub async fn join(
        state: &GatewayState,
        connection: &Arc<Connection>,
        target: RoomTarget,
        nonce: Option<String>,
    ) -> HandlerResult<()> {
        let room = target.resolve()?;

        eligibility::ensure_room_member(state, connection.user_id(), room).await?;

        let joined = state.connection_manager().join_room(connection, room).await;

        if joined {
            state
                .bus()
                .subscribe(&[PubSubChannel::room(room)])
                .await?;

            tracing::debug!(
                connection_id = %connection.connection_id(),
                user_id = %connection.user_id(),
                room = %room,
                "Joined room"
            );
        }

        if let Some(nonce) = nonce {
            let _ = connection
                .send(ServerFrame::ack(
                    nonce,
                    serde_json::json!({ "room": room.name() }),
                ))
                .await;
        }

        Ok(())
    }

    /// Unsubscribe a connection from a text room
    ///
    /// Idempotent; leaving a room that was never joined is a no-op.
    pub async fn leave(
        state: &GatewayState,
        connection: &Arc<Connection>,
        target: RoomTarget,
        nonce: Option<String>,
    ) -> HandlerResult<()> {
        let room = target.resolve()?;

        let left = state
            .connection_manager()
            .leave_room(connection, room)
            .await;

        if left && state.connection_manager().room_is_empty(room) {
            state
                .bus()
                .unsubscribe(&[PubSubChannel::room(room)])
                .await?;
        }

        if let Some(nonce) = nonce {
            let _ = connection
                .send(ServerFrame::ack(
                    nonce,
                    serde_json::json!({ "room": room.name() }),
                ))
                .await;
        }

        Ok(())
    }
}
