//! User entity <-> model mapper

use huddle_core::entities::User;
use huddle_core::value_objects::Snowflake;

use crate::models::UserModel;

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: Snowflake::new(model.id),
            username: model.username,
        }
    }
}
