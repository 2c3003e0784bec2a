//! Message create/edit/delete
//!
//! Creation requires room eligibility; edit and delete are author-only and
//! silently no-op on a mismatch or a missing row.

use std::sync::Arc;

use huddle_cache::PubSubChannel;
use huddle_core::{Attachment, DomainError, Message};

use crate::connection::Connection;
use crate::handlers::{eligibility, publish_event, HandlerError, HandlerResult};
use crate::protocol::{
    events, MessageCreatePayload, MessageDeletedView, MessageEditPayload, MessageRefPayload,
    MessageView, ServerFrame,
};
use crate::server::GatewayState;

/// Maximum message content length in characters
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// Handles `message.create` / `message.edit` / `message.delete`
pub struct MessageHandler;

impl MessageHandler {
    /// Persist a new message and broadcast it to the room
    pub async fn create(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: MessageCreatePayload,
        nonce: Option<String>,
    ) -> HandlerResult<()> {
        let room = payload.target.resolve()?;
        let author_id = connection.user_id();

        let content = payload
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if content.is_none() && payload.attachments.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }

        if let Some(content) = &content {
            if content.chars().count() > MAX_CONTENT_LENGTH {
                return Err(DomainError::ContentTooLong {
                    max: MAX_CONTENT_LENGTH,
                }
                .into());
            }
        }

        eligibility::ensure_room_member(state, author_id, room).await?;

        let message = Message::new(state.snowflakes().generate(), room, author_id, content);
        let attachments: Vec<Attachment> = payload
            .attachments
            .into_iter()
            .map(|a| Attachment {
                id: state.snowflakes().generate(),
                message_id: message.id,
                filename: a.filename,
                content_type: a.content_type,
                size: a.size,
                url: a.url,
            })
            .collect();

        state
            .repositories()
            .messages
            .create(&message, &attachments)
            .await?;

        let view = MessageView::new(&message, &attachments);

        publish_event(
            state,
            &PubSubChannel::room(room),
            events::MESSAGE_CREATED,
            &view,
            None,
        )
        .await?;

        tracing::debug!(
            message_id = %message.id,
            author_id = %author_id,
            room = %room,
            "Message created"
        );

        if let Some(nonce) = nonce {
            let data = serde_json::to_value(&view)
                .map_err(|e| HandlerError::Internal(e.to_string()))?;
            let _ = connection.send(ServerFrame::ack(nonce, data)).await;
        }

        Ok(())
    }

    /// Edit a message's content and broadcast the update
    ///
    /// No-ops unless the sender authored the message and the row is live.
    pub async fn edit(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: MessageEditPayload,
    ) -> HandlerResult<()> {
        let content = payload.content.trim().to_string();
        if content.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(DomainError::ContentTooLong {
                max: MAX_CONTENT_LENGTH,
            }
            .into());
        }

        let Some(mut message) = Self::owned_live_message(state, connection, payload.message_id).await?
        else {
            return Ok(());
        };
        let Some(room) = message.room_key() else {
            return Ok(());
        };

        message.edit(content);
        state.repositories().messages.update_content(&message).await?;

        publish_event(
            state,
            &PubSubChannel::room(room),
            events::MESSAGE_UPDATED,
            &MessageView::new(&message, &[]),
            None,
        )
        .await
    }

    /// Soft-delete a message and broadcast the removal
    ///
    /// No-ops unless the sender authored the message and the row is live.
    pub async fn delete(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: MessageRefPayload,
    ) -> HandlerResult<()> {
        let Some(message) = Self::owned_live_message(state, connection, payload.message_id).await?
        else {
            return Ok(());
        };
        let Some(room) = message.room_key() else {
            return Ok(());
        };

        state.repositories().messages.soft_delete(message.id).await?;

        publish_event(
            state,
            &PubSubChannel::room(room),
            events::MESSAGE_DELETED,
            &MessageDeletedView {
                message_id: message.id,
                target: room.into(),
            },
            None,
        )
        .await?;

        tracing::debug!(
            message_id = %message.id,
            author_id = %connection.user_id(),
            "Message deleted"
        );

        Ok(())
    }

    /// Fetch a message if it exists, is not deleted, and the sender wrote it
    async fn owned_live_message(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message_id: huddle_core::Snowflake,
    ) -> HandlerResult<Option<Message>> {
        let message = state.repositories().messages.find_by_id(message_id).await?;

        Ok(message
            .filter(|m| !m.is_deleted())
            .filter(|m| m.author_id == connection.user_id()))
    }
}
