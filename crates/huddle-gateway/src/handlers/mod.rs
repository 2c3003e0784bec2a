//! Client event handlers
//!
//! The router validates the frame, dispatches to the matching handler, and
//! turns handler errors into a best-effort `error` frame for the sender.
//! Handler failures never affect other connections.

mod error;
mod message;
mod presence;
mod reaction;
mod rooms;
mod typing;

pub mod eligibility;

pub use error::{HandlerError, HandlerResult};
pub use message::MessageHandler;
pub use presence::PresenceHandler;
pub use reaction::ReactionHandler;
pub use rooms::RoomHandler;
pub use typing::TypingHandler;

use std::sync::Arc;

use serde::Serialize;

use huddle_cache::{PubSubChannel, PubSubEvent};
use huddle_core::Snowflake;

use crate::connection::Connection;
use crate::protocol::{ClientEvent, ClientFrame, ServerFrame};
use crate::server::GatewayState;
use crate::voice::VoiceCoordinator;

/// Publish a typed payload to the event bus
pub(crate) async fn publish_event<T: Serialize>(
    state: &GatewayState,
    channel: &PubSubChannel,
    event_type: &str,
    payload: &T,
    exclude_user: Option<Snowflake>,
) -> HandlerResult<()> {
    let data = serde_json::to_value(payload)
        .map_err(|e| HandlerError::Internal(format!("Failed to serialize {event_type}: {e}")))?;

    let mut event = PubSubEvent::new(event_type, data);
    if let Some(user_id) = exclude_user {
        event = event.excluding(user_id);
    }

    state.bus().publish(channel, &event).await?;
    Ok(())
}

/// Dispatch incoming client frames to the matching handler
pub struct FrameRouter;

impl FrameRouter {
    /// Handle one client frame
    ///
    /// Errors are reported to the sender as an `error` frame (best effort,
    /// echoing the nonce when one was supplied) and are otherwise swallowed.
    pub async fn route(state: &GatewayState, connection: &Arc<Connection>, frame: ClientFrame) {
        let nonce = frame.nonce.clone();
        let event_type = frame.t.clone();

        if let Err(e) = Self::dispatch(state, connection, frame).await {
            tracing::debug!(
                connection_id = %connection.connection_id(),
                user_id = %connection.user_id(),
                event = %event_type,
                error = %e,
                "Client event rejected"
            );

            let _ = connection
                .send(ServerFrame::error(e.code(), e.to_string(), nonce))
                .await;
        }
    }

    async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        frame: ClientFrame,
    ) -> HandlerResult<()> {
        let nonce = frame.nonce.clone();
        let event = frame.into_event()?;

        match event {
            ClientEvent::Heartbeat => {
                connection.mark_heartbeat().await;
                let _ = connection.send(ServerFrame::heartbeat_ack()).await;
                Ok(())
            }
            ClientEvent::RoomJoin(target) => {
                RoomHandler::join(state, connection, target, nonce).await
            }
            ClientEvent::RoomLeave(target) => {
                RoomHandler::leave(state, connection, target, nonce).await
            }
            ClientEvent::PresenceUpdate(payload) => {
                PresenceHandler::update(state, connection, payload).await
            }
            ClientEvent::TypingStart(target) => {
                TypingHandler::start(state, connection, target).await
            }
            ClientEvent::MessageCreate(payload) => {
                MessageHandler::create(state, connection, payload, nonce).await
            }
            ClientEvent::MessageEdit(payload) => {
                MessageHandler::edit(state, connection, payload).await
            }
            ClientEvent::MessageDelete(payload) => {
                MessageHandler::delete(state, connection, payload).await
            }
            ClientEvent::ReactionAdd(payload) => {
                ReactionHandler::add(state, connection, payload).await
            }
            ClientEvent::ReactionRemove(payload) => {
                ReactionHandler::remove(state, connection, payload).await
            }
            ClientEvent::VoiceJoin(payload) => {
                VoiceCoordinator::join(state, connection, payload).await
            }
            ClientEvent::VoiceLeave(target) => {
                VoiceCoordinator::leave(state, connection, target).await
            }
            ClientEvent::VoiceSignal(payload) => {
                VoiceCoordinator::signal(state, connection, payload).await
            }
            ClientEvent::VoiceMediaUpdate(payload) => {
                VoiceCoordinator::media_update(state, connection, payload).await
            }
        }
    }
}
