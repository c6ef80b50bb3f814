//! Multi-Client TCP Messenger Server - Entry Point
//!
//! Binds the listener, starts the broadcast loop, and accepts connections.

use std::env;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use console_messenger::MessengerServer;

/// Default server address
const DEFAULT_ADDR: &str = "0.0.0.0:2431";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=console_messenger=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("console_messenger=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = match MessengerServer::bind(&addr).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Messenger server listening on {}", addr);

    server.run().await;

    Ok(())
}
