//! Room eligibility checks
//!
//! Channels require server membership; DM threads require participation.
//! Voice joins additionally require the channel to be voice-kind.

use huddle_core::{DomainError, RoomKey, Snowflake};

use crate::server::GatewayState;

/// Check that a user may act in a text room
pub async fn ensure_room_member(
    state: &GatewayState,
    user_id: Snowflake,
    room: RoomKey,
) -> Result<(), DomainError> {
    let repos = state.repositories();

    match room {
        RoomKey::Channel(channel_id) => {
            let channel = repos
                .channels
                .find_by_id(channel_id)
                .await?
                .ok_or(DomainError::ChannelNotFound(channel_id))?;

            if !repos.memberships.is_member(channel.server_id, user_id).await? {
                return Err(DomainError::NotServerMember);
            }
        }
        RoomKey::Thread(thread_id) => {
            repos
                .threads
                .find_by_id(thread_id)
                .await?
                .ok_or(DomainError::ThreadNotFound(thread_id))?;

            if !repos.threads.is_participant(thread_id, user_id).await? {
                return Err(DomainError::NotThreadParticipant);
            }
        }
    }

    Ok(())
}

/// Check that a user may join a voice room
pub async fn ensure_voice_eligible(
    state: &GatewayState,
    user_id: Snowflake,
    room: RoomKey,
) -> Result<(), DomainError> {
    let repos = state.repositories();

    match room {
        RoomKey::Channel(channel_id) => {
            let channel = repos
                .channels
                .find_by_id(channel_id)
                .await?
                .ok_or(DomainError::ChannelNotFound(channel_id))?;

            if !channel.is_voice() {
                return Err(DomainError::NotVoiceChannel(channel_id));
            }

            if !repos.memberships.is_member(channel.server_id, user_id).await? {
                return Err(DomainError::NotServerMember);
            }
        }
        RoomKey::Thread(_) => {
            // Threads double as ad-hoc voice rooms for their participants
            ensure_room_member(state, user_id, room).await?;
        }
    }

    Ok(())
}
