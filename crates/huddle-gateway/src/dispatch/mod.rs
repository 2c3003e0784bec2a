//! Event dispatcher
//!
//! Background task that consumes the event bus and routes events to the
//! local connections: room topics to room members, voice topics to voice
//! members, user topics to that user's connections, broadcast to everyone.
//! Per-event sender exclusion is honored on every path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use huddle_cache::{EventBus, PubSubChannel, ReceivedMessage};

use crate::connection::ConnectionManager;
use crate::protocol::ServerFrame;

/// Routes event bus messages to WebSocket connections
pub struct EventDispatcher {
    bus: Arc<dyn EventBus>,
    connection_manager: Arc<ConnectionManager>,
    running: Arc<AtomicBool>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    pub fn new(bus: Arc<dyn EventBus>, connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            bus,
            connection_manager,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the dispatch loop on a background task
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run().await;
        });

        tracing::info!("Event dispatcher started");
    }

    /// Stop the dispatch loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the dispatcher is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let mut receiver = self.bus.receiver();

        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.handle_message(msg).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event dispatcher channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }

    async fn handle_message(&self, msg: ReceivedMessage) {
        let Some(event) = &msg.event else {
            tracing::debug!(
                channel = %msg.channel,
                "Received non-event message, ignoring"
            );
            return;
        };

        let frame = ServerFrame::event(&event.event_type, event.data.clone());
        let exclude_user = event.exclude_user;

        let sent = match &msg.channel {
            PubSubChannel::Room(key) => {
                self.connection_manager
                    .send_to_room(*key, frame, exclude_user)
                    .await
            }
            PubSubChannel::Voice(key) => {
                self.connection_manager
                    .send_to_voice_room(*key, frame, exclude_user)
                    .await
            }
            PubSubChannel::User(user_id) => {
                self.connection_manager.send_to_user(*user_id, frame).await
            }
            PubSubChannel::Broadcast => {
                self.connection_manager
                    .broadcast(frame, exclude_user)
                    .await
            }
            PubSubChannel::Custom(name) => {
                tracing::debug!(
                    channel = %name,
                    event_type = %event.event_type,
                    "Event on custom channel, ignoring"
                );
                return;
            }
        };

        tracing::trace!(
            channel = %msg.channel,
            event_type = %event.event_type,
            sent = sent,
            "Event dispatched"
        );
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
