//! Gateway server setup
//!
//! Wires up the axum router and all runtime dependencies.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::{GatewayState, Repositories};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use huddle_cache::{
    EventBus, PubSubChannel, Publisher, RedisEventBus, RedisPool, RedisPoolConfig, SessionStore,
    Subscriber, SubscriberConfig,
};
use huddle_common::{AppConfig, AppError, JwtService};
use huddle_core::SnowflakeGenerator;

use crate::auth::Authenticator;
use crate::connection::ConnectionManager;
use crate::dispatch::EventDispatcher;
use crate::voice::VoiceRegistry;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    tracing::info!("Connecting to PostgreSQL...");
    let db_config = huddle_db::DatabaseConfig::from_config(&config.database);
    let pool = huddle_db::create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    tracing::info!("Connecting to Redis...");
    let redis_pool = RedisPool::new(RedisPoolConfig::from(&config.redis))
        .map_err(|e| AppError::Cache(e.to_string()))?;
    tracing::info!("Redis connection established");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));

    let snowflakes = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));

    let repositories = Repositories {
        users: Arc::new(huddle_db::PgUserRepository::new(pool.clone())),
        channels: Arc::new(huddle_db::PgChannelRepository::new(pool.clone())),
        threads: Arc::new(huddle_db::PgThreadRepository::new(pool.clone())),
        memberships: Arc::new(huddle_db::PgMembershipRepository::new(pool.clone())),
        messages: Arc::new(huddle_db::PgMessageRepository::new(pool.clone())),
        reactions: Arc::new(huddle_db::PgReactionRepository::new(pool.clone())),
        presences: Arc::new(huddle_db::PgPresenceRepository::new(pool)),
    };

    let sessions = SessionStore::new(redis_pool.clone());
    let authenticator = Arc::new(Authenticator::new(
        jwt_service,
        sessions,
        repositories.users.clone(),
    ));

    // Event bus: publisher over the pool, subscriber on its own connection
    let publisher = Publisher::new(redis_pool);
    let subscriber = Subscriber::new(SubscriberConfig {
        redis_url: config.redis.url.clone(),
        ..SubscriberConfig::default()
    });
    let bus: Arc<dyn EventBus> = Arc::new(RedisEventBus::new(publisher, subscriber));

    // Every instance listens on the broadcast channel
    bus.subscribe(&[PubSubChannel::broadcast()])
        .await
        .map_err(|e| AppError::Cache(format!("Failed to subscribe broadcast channel: {e}")))?;

    let connection_manager = ConnectionManager::new_shared();
    let voice_rooms = VoiceRegistry::new_shared();

    let dispatcher = Arc::new(EventDispatcher::new(bus.clone(), connection_manager.clone()));
    dispatcher.start();

    Ok(GatewayState::new(
        repositories,
        bus,
        authenticator,
        connection_manager,
        voice_rooms,
        snowflakes,
        config.heartbeat.clone(),
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {e}")))?;

    let state = create_gateway_state(&config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
