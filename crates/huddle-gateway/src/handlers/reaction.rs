//! Reaction add/remove
//!
//! Both directions are idempotent per (message, user, emoji). After either
//! operation the current count is recomputed and broadcast, so concurrent
//! updates converge on the same number everywhere.

use std::sync::Arc;

use huddle_cache::PubSubChannel;

use crate::connection::Connection;
use crate::handlers::{publish_event, HandlerResult};
use crate::protocol::{events, ReactionPayload, ReactionUpdatedView};
use crate::server::GatewayState;

/// Handles `reaction.add` / `reaction.remove`
pub struct ReactionHandler;

impl ReactionHandler {
    /// Add a reaction and broadcast the converged count
    pub async fn add(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: ReactionPayload,
    ) -> HandlerResult<()> {
        if !Self::message_is_live(state, payload.message_id).await? {
            return Ok(());
        }

        state
            .repositories()
            .reactions
            .upsert(payload.message_id, connection.user_id(), &payload.emoji)
            .await?;

        Self::broadcast_count(state, connection, payload).await
    }

    /// Remove a reaction and broadcast the converged count
    pub async fn remove(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: ReactionPayload,
    ) -> HandlerResult<()> {
        if !Self::message_is_live(state, payload.message_id).await? {
            return Ok(());
        }

        state
            .repositories()
            .reactions
            .delete(payload.message_id, connection.user_id(), &payload.emoji)
            .await?;

        Self::broadcast_count(state, connection, payload).await
    }

    async fn message_is_live(
        state: &GatewayState,
        message_id: huddle_core::Snowflake,
    ) -> HandlerResult<bool> {
        let message = state.repositories().messages.find_by_id(message_id).await?;
        Ok(message.is_some_and(|m| !m.is_deleted()))
    }

    async fn broadcast_count(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: ReactionPayload,
    ) -> HandlerResult<()> {
        let count = state
            .repositories()
            .reactions
            .count(payload.message_id, &payload.emoji)
            .await?;

        publish_event(
            state,
            &PubSubChannel::broadcast(),
            events::REACTION_UPDATED,
            &ReactionUpdatedView {
                message_id: payload.message_id,
                emoji: payload.emoji,
                count,
                user_id: connection.user_id(),
            },
            None,
        )
        .await
    }
}
