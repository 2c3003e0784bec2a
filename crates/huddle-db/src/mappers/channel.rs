//! Channel entity <-> model mapper

use huddle_core::entities::{Channel, ChannelKind};
use huddle_core::value_objects::Snowflake;

use crate::models::ChannelModel;

impl From<ChannelModel> for Channel {
    fn from(model: ChannelModel) -> Self {
        let kind = if model.kind == "voice" {
            ChannelKind::Voice
        } else {
            ChannelKind::Text
        };

        Channel {
            id: Snowflake::new(model.id),
            server_id: Snowflake::new(model.server_id),
            kind,
            name: model.name,
        }
    }
}
