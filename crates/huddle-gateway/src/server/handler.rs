//! WebSocket handler
//!
//! Authenticates the handshake before the upgrade, then runs the
//! recv/send/heartbeat task trio for the connection's lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use uuid::Uuid;

use huddle_cache::PubSubChannel;
use huddle_common::{AppError, ErrorResponse};
use huddle_core::PresenceStatus;

use crate::auth::extract_token;
use crate::connection::{Connection, Identity};
use crate::handlers::{publish_event, FrameRouter};
use crate::protocol::{events, ClientFrame, PresenceStatePayload, ServerFrame};
use crate::server::GatewayState;
use crate::voice::VoiceCoordinator;

/// Channel buffer size for outgoing frames
const FRAME_BUFFER_SIZE: usize = 100;

/// WebSocket gateway handler
///
/// Credentials are validated before the upgrade; a bad handshake gets
/// HTTP 401 and no connection state is ever created for it.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(token) = extract_token(&headers, &query) else {
        return unauthorized(&AppError::MissingAuth);
    };

    let identity = match state.authenticator().authenticate(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "Handshake rejected");
            return unauthorized(&e);
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, socket, identity))
}

fn unauthorized(err: &AppError) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::from(err))).into_response()
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, identity: Identity) {
    let connection_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(FRAME_BUFFER_SIZE);

    let connection = Connection::new(connection_id.clone(), identity, tx);
    state.connection_manager().add_connection(connection.clone());

    let user_id = connection.user_id();
    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    // Direct deliveries (voice signals) arrive on the user topic
    if let Err(e) = state.bus().subscribe(&[PubSubChannel::user(user_id)]).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to subscribe user topic");
    }

    // First connection of a user flips them online
    if state.connection_manager().get_user_connections(user_id).len() == 1 {
        announce_presence(&state, user_id, PresenceStatus::Online).await;
    }

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Send the hello frame immediately
    let hello = ServerFrame::hello(state.heartbeat().interval_secs * 1000);
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json)).await.is_err() {
            tracing::warn!(connection_id = %connection_id, "Failed to send hello frame");
            cleanup_connection(&state, &connection).await;
            return;
        }
    }

    let state_recv = state.clone();
    let connection_recv = connection.clone();

    // Receive loop: parse and route client frames
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match ClientFrame::from_json(&text) {
                    Ok(frame) => {
                        FrameRouter::route(&state_recv, &connection_recv, frame).await;
                    }
                    Err(e) => {
                        // Malformed frames are dropped, not fatal
                        tracing::debug!(
                            connection_id = %connection_recv.connection_id(),
                            error = %e,
                            "Dropped malformed frame"
                        );
                        let _ = connection_recv
                            .send(ServerFrame::error("INVALID_PAYLOAD", e.to_string(), None))
                            .await;
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_recv.connection_id(),
                        "Binary frames not supported, dropped"
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong replies are handled by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        connection_id = %connection_recv.connection_id(),
                        "Client closed connection"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_recv.connection_id(),
                        error = %e,
                        "WebSocket error"
                    );
                    return;
                }
            }
        }
    });

    let connection_id_send = connection_id.clone();

    // Send loop: drain the frame channel into the socket
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame.to_json() {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json)).await.is_err() {
                        tracing::warn!(
                            connection_id = %connection_id_send,
                            "Failed to send frame to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_id_send,
                        error = %e,
                        "Failed to serialize frame"
                    );
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    let connection_hb = connection.clone();
    let heartbeat = state.heartbeat().clone();

    // Heartbeat watchdog: close connections that went silent
    let heartbeat_task = tokio::spawn(async move {
        let timeout = Duration::from_secs(heartbeat.client_timeout_secs);
        let mut check_interval =
            interval(Duration::from_secs(heartbeat.interval_secs.max(2) / 2));

        loop {
            check_interval.tick().await;

            let since = connection_hb.time_since_heartbeat().await;
            if since > timeout {
                tracing::warn!(
                    connection_id = %connection_hb.connection_id(),
                    silent_ms = since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                break;
            }
        }
    });

    tokio::select! {
        _ = recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
        }
        _ = send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
        }
        _ = heartbeat_task => {
            tracing::debug!(connection_id = %connection_id, "Heartbeat task ended");
        }
    }

    cleanup_connection(&state, &connection).await;
}

/// Clean up a connection on disconnect
///
/// Voice reaping runs first, then room unsubscription, then the presence
/// transition when this was the user's last connection.
async fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>) {
    let user_id = connection.user_id();

    tracing::info!(
        connection_id = %connection.connection_id(),
        user_id = %user_id,
        "Cleaning up connection"
    );

    VoiceCoordinator::reap(state, connection).await;

    for room in connection.rooms().await {
        state.connection_manager().leave_room(connection, room).await;

        if state.connection_manager().room_is_empty(room) {
            if let Err(e) = state.bus().unsubscribe(&[PubSubChannel::room(room)]).await {
                tracing::warn!(room = %room, error = %e, "Failed to unsubscribe room topic");
            }
        }
    }

    let has_other_connections = state
        .connection_manager()
        .get_user_connections(user_id)
        .iter()
        .any(|c| c.connection_id() != connection.connection_id());

    if !has_other_connections {
        if let Err(e) = state
            .bus()
            .unsubscribe(&[PubSubChannel::user(user_id)])
            .await
        {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to unsubscribe user topic");
        }

        announce_presence(state, user_id, PresenceStatus::Offline).await;
    }

    state
        .connection_manager()
        .remove_connection(connection.connection_id())
        .await;
}

/// Persist and broadcast a presence transition; failures are logged, not fatal
async fn announce_presence(
    state: &GatewayState,
    user_id: huddle_core::Snowflake,
    status: PresenceStatus,
) {
    if let Err(e) = state.repositories().presences.upsert(user_id, status).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to persist presence");
    }

    if let Err(e) = publish_event(
        state,
        &PubSubChannel::broadcast(),
        events::PRESENCE_STATE,
        &PresenceStatePayload { user_id, status },
        None,
    )
    .await
    {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to broadcast presence");
    }

    tracing::debug!(user_id = %user_id, status = %status, "Presence updated");
}
