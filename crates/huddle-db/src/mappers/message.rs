//! Message and Attachment entity <-> model mapper

use huddle_core::entities::{Attachment, Message};
use huddle_core::value_objects::Snowflake;

use crate::models::{AttachmentModel, MessageModel};

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            channel_id: model.channel_id.map(Snowflake::new),
            thread_id: model.thread_id.map(Snowflake::new),
            author_id: Snowflake::new(model.author_id),
            content: model.content,
            created_at: model.created_at,
            edited_at: model.edited_at,
            deleted_at: model.deleted_at,
        }
    }
}

impl From<AttachmentModel> for Attachment {
    fn from(model: AttachmentModel) -> Self {
        Attachment {
            id: Snowflake::new(model.id),
            message_id: Snowflake::new(model.message_id),
            filename: model.filename,
            content_type: model.content_type,
            size: model.size,
            url: model.url,
        }
    }
}
