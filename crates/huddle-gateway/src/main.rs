//! Huddle gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p huddle-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use huddle_common::{init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Tracing may not be installed yet when configuration fails
        eprintln!("Gateway failed to start: {e}");
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    init_tracing(&TracingConfig::for_environment(config.app.env));

    info!(
        env = ?config.app.env,
        port = config.gateway.port,
        "Starting huddle gateway..."
    );

    huddle_gateway::server::run(config).await?;

    Ok(())
}
