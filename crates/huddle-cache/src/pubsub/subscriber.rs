//! Redis Pub/Sub subscriber
//!
//! Owns a dedicated Pub/Sub connection on a background task. Subscription
//! changes arrive over a control channel because the message stream borrows
//! the connection exclusively; received messages fan out over a broadcast
//! channel. On connection loss the task reconnects and replays the watched
//! channel set.

use crate::pubsub::{PubSubChannel, PubSubEvent};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to parse event: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("subscriber task is gone")]
    ChannelClosed,
}

pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// One message delivered by Redis Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Channel the message arrived on
    pub channel: PubSubChannel,
    /// Decoded event, when the payload was a valid envelope
    pub event: Option<PubSubEvent>,
    /// Raw payload as published
    pub payload: String,
}

impl ReceivedMessage {
    fn decode(channel_name: &str, payload: String) -> Self {
        Self {
            channel: PubSubChannel::parse(channel_name),
            event: serde_json::from_str(&payload).ok(),
            payload,
        }
    }
}

/// Subscriber tuning
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub redis_url: String,
    /// Capacity of the fan-out broadcast channel
    pub broadcast_buffer: usize,
    /// Backoff between reconnect attempts
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Subscription changes sent to the background task
#[derive(Debug)]
enum Control {
    Watch(Vec<String>),
    Drop(Vec<String>),
}

/// Handle to the background Pub/Sub listener
pub struct Subscriber {
    watched: Arc<RwLock<HashSet<String>>>,
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    control_tx: mpsc::Sender<Control>,
}

impl Subscriber {
    /// Spawn the listener task and return its handle
    ///
    /// The task runs until every `Subscriber` clone of the control sender is
    /// dropped.
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);
        let watched = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(supervise(
            config,
            watched.clone(),
            broadcast_tx.clone(),
            control_rx,
        ));

        Self {
            watched,
            broadcast_tx,
            control_tx,
        }
    }

    /// Start receiving messages published to these channels
    pub async fn subscribe(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        self.send_control(Control::Watch(Self::names(channels))).await
    }

    /// Stop receiving messages from these channels
    pub async fn unsubscribe(&self, channels: &[PubSubChannel]) -> SubscriberResult<()> {
        self.send_control(Control::Drop(Self::names(channels))).await
    }

    /// New receiver over everything this subscriber picks up
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Whether a channel is currently in the watched set
    pub async fn is_watching(&self, channel: &PubSubChannel) -> bool {
        self.watched.read().await.contains(&channel.name())
    }

    fn names(channels: &[PubSubChannel]) -> Vec<String> {
        channels.iter().map(PubSubChannel::name).collect()
    }

    async fn send_control(&self, control: Control) -> SubscriberResult<()> {
        self.control_tx
            .send(control)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

/// Reconnect-forever wrapper around [`serve_connection`]
async fn supervise(
    config: SubscriberConfig,
    watched: Arc<RwLock<HashSet<String>>>,
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    mut control_rx: mpsc::Receiver<Control>,
) {
    loop {
        match serve_connection(&config, &watched, &broadcast_tx, &mut control_rx).await {
            Ok(()) => {
                tracing::info!("Pub/Sub subscriber stopped");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Pub/Sub connection lost, reconnecting");
                tokio::time::sleep(std::time::Duration::from_millis(config.reconnect_delay_ms))
                    .await;
            }
        }
    }
}

/// Drive one Pub/Sub connection until it fails or the handle is dropped
///
/// Returns `Ok(())` only on orderly shutdown (control channel closed).
async fn serve_connection(
    config: &SubscriberConfig,
    watched: &Arc<RwLock<HashSet<String>>>,
    broadcast_tx: &broadcast::Sender<ReceivedMessage>,
    control_rx: &mut mpsc::Receiver<Control>,
) -> SubscriberResult<()> {
    let client = Client::open(config.redis_url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;

    // Replay the watched set after a reconnect
    let replay: Vec<String> = watched.read().await.iter().cloned().collect();
    for name in &replay {
        pubsub.subscribe(name).await?;
    }

    tracing::info!(channels = replay.len(), "Pub/Sub subscriber connected");

    let mut stream = pubsub.on_message();

    loop {
        tokio::select! {
            msg = stream.next() => {
                let Some(msg) = msg else {
                    return Err(SubscriberError::Redis(redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "pub/sub stream ended",
                    ))));
                };

                let name = msg.get_channel_name().to_string();
                let payload: String = msg.get_payload().unwrap_or_default();
                tracing::trace!(channel = %name, "Pub/Sub message received");

                // No receivers just means no local connections care yet
                let _ = broadcast_tx.send(ReceivedMessage::decode(&name, payload));
            }

            control = control_rx.recv() => {
                let Some(control) = control else { return Ok(()) };

                // The stream holds the connection mutably; release it while
                // changing subscriptions, then resume.
                drop(stream);
                apply_control(&mut pubsub, watched, control).await;
                stream = pubsub.on_message();
            }
        }
    }
}

async fn apply_control(
    pubsub: &mut redis::aio::PubSub,
    watched: &Arc<RwLock<HashSet<String>>>,
    control: Control,
) {
    match control {
        Control::Watch(names) => {
            for name in names {
                match pubsub.subscribe(&name).await {
                    Ok(()) => {
                        tracing::debug!(channel = %name, "watching channel");
                        watched.write().await.insert(name);
                    }
                    Err(e) => {
                        tracing::error!(channel = %name, error = %e, "subscribe failed");
                    }
                }
            }
        }
        Control::Drop(names) => {
            for name in names {
                match pubsub.unsubscribe(&name).await {
                    Ok(()) => {
                        tracing::debug!(channel = %name, "dropped channel");
                        watched.write().await.remove(&name);
                    }
                    Err(e) => {
                        tracing::error!(channel = %name, error = %e, "unsubscribe failed");
                    }
                }
            }
        }
    }
}
