//! Thread entity <-> model mapper

use huddle_core::entities::Thread;
use huddle_core::value_objects::Snowflake;

use crate::models::ThreadModel;

impl From<ThreadModel> for Thread {
    fn from(model: ThreadModel) -> Self {
        Thread {
            id: Snowflake::new(model.id),
        }
    }
}
