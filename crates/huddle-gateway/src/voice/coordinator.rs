//! Voice room membership and signaling relay
//!
//! Join/leave mutate the process-local registry; membership notifications,
//! media-flag updates and WebRTC signaling all travel over the event bus.
//! Store I/O never runs while the registry lock is held.

use std::sync::Arc;

use huddle_cache::PubSubChannel;
use huddle_core::RoomKey;

use crate::connection::Connection;
use crate::handlers::{eligibility, publish_event, HandlerResult};
use crate::protocol::{
    events, RoomTarget, ServerFrame, VoiceJoinPayload, VoiceMediaPayload, VoiceMediaUpdatedView,
    VoiceParticipantJoinedView, VoiceParticipantLeftView, VoiceParticipantsView,
    VoiceSignalPayload, VoiceSignalView,
};
use crate::server::GatewayState;

/// Handles the `rtc.*` client events and disconnect reaping
pub struct VoiceCoordinator;

impl VoiceCoordinator {
    /// Join a voice room
    ///
    /// Rejoining the same room refreshes the video flag without a second
    /// membership. The caller gets the current roster (excluding itself);
    /// the rest of the room is notified of the arrival and its video flag,
    /// on rejoin as well as on a fresh join.
    pub async fn join(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: VoiceJoinPayload,
    ) -> HandlerResult<()> {
        let room = payload.target.resolve()?;
        let user_id = connection.user_id();

        eligibility::ensure_voice_eligible(state, user_id, room).await?;

        let outcome = state
            .voice_rooms()
            .join(room, user_id, payload.enable_video);

        state
            .connection_manager()
            .join_voice_room(connection, room)
            .await;

        state
            .bus()
            .subscribe(&[PubSubChannel::voice(room)])
            .await?;

        let participants = state.voice_rooms().participants_excluding(room, user_id);
        let roster = VoiceParticipantsView {
            room: room.name(),
            participants,
        };
        let data = serde_json::to_value(&roster)
            .map_err(|e| crate::handlers::HandlerError::Internal(e.to_string()))?;
        let _ = connection
            .send(ServerFrame::event(events::RTC_PARTICIPANTS, data))
            .await;

        publish_event(
            state,
            &PubSubChannel::voice(room),
            events::RTC_PARTICIPANT_JOINED,
            &VoiceParticipantJoinedView {
                room: room.name(),
                user_id,
                video_enabled: payload.enable_video,
            },
            Some(user_id),
        )
        .await?;

        tracing::debug!(
            user_id = %user_id,
            room = %room,
            video = payload.enable_video,
            rejoined = outcome.rejoined,
            "Joined voice room"
        );

        Ok(())
    }

    /// Leave a voice room
    ///
    /// No-op unless the user is a participant.
    pub async fn leave(
        state: &GatewayState,
        connection: &Arc<Connection>,
        target: RoomTarget,
    ) -> HandlerResult<()> {
        let room = target.resolve()?;
        let user_id = connection.user_id();

        if !state.voice_rooms().leave(room, user_id) {
            return Ok(());
        }

        state
            .connection_manager()
            .leave_voice_room(connection, room)
            .await;

        Self::after_leave(state, connection, room).await
    }

    /// Relay a WebRTC signal to one participant
    ///
    /// Dropped unless both the sender and the target are current
    /// participants; never queued.
    pub async fn signal(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: VoiceSignalPayload,
    ) -> HandlerResult<()> {
        let room = payload.target.resolve()?;
        let user_id = connection.user_id();

        let registry = state.voice_rooms();
        if !registry.contains(room, user_id) || !registry.contains(room, payload.target_user_id) {
            tracing::trace!(
                from = %user_id,
                to = %payload.target_user_id,
                room = %room,
                "Signal between non-participants, dropped"
            );
            return Ok(());
        }

        publish_event(
            state,
            &PubSubChannel::user(payload.target_user_id),
            events::RTC_SIGNAL,
            &VoiceSignalView {
                room: room.name(),
                from_user_id: user_id,
                payload: payload.payload,
            },
            None,
        )
        .await
    }

    /// Update the sender's video flag and notify the rest of the room
    ///
    /// No-op unless the user is a participant.
    pub async fn media_update(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: VoiceMediaPayload,
    ) -> HandlerResult<()> {
        let room = payload.target.resolve()?;
        let user_id = connection.user_id();

        if !state
            .voice_rooms()
            .set_video(room, user_id, payload.video_enabled)
        {
            return Ok(());
        }

        publish_event(
            state,
            &PubSubChannel::voice(room),
            events::RTC_MEDIA_UPDATED,
            &VoiceMediaUpdatedView {
                room: room.name(),
                user_id,
                video_enabled: payload.video_enabled,
            },
            Some(user_id),
        )
        .await
    }

    /// Leave every voice room on disconnect
    ///
    /// Drains the connection's joined set so the teardown runs exactly once
    /// and emits exactly one departure per room.
    pub async fn reap(state: &GatewayState, connection: &Arc<Connection>) {
        let user_id = connection.user_id();

        for room in connection.drain_voice_rooms().await {
            state
                .connection_manager()
                .unindex_voice_room(connection.connection_id(), room);

            if !state.voice_rooms().leave(room, user_id) {
                continue;
            }

            if let Err(e) = Self::after_leave(state, connection, room).await {
                tracing::warn!(
                    user_id = %user_id,
                    room = %room,
                    error = %e,
                    "Failed to announce voice departure during reap"
                );
            }
        }
    }

    /// Shared post-leave steps: topic unsubscribe and departure notification
    async fn after_leave(
        state: &GatewayState,
        connection: &Arc<Connection>,
        room: RoomKey,
    ) -> HandlerResult<()> {
        let user_id = connection.user_id();

        if state.connection_manager().voice_room_is_empty(room) {
            state
                .bus()
                .unsubscribe(&[PubSubChannel::voice(room)])
                .await?;
        }

        publish_event(
            state,
            &PubSubChannel::voice(room),
            events::RTC_PARTICIPANT_LEFT,
            &VoiceParticipantLeftView {
                room: room.name(),
                user_id,
            },
            Some(user_id),
        )
        .await?;

        tracing::debug!(user_id = %user_id, room = %room, "Left voice room");

        Ok(())
    }
}
