//! Chat relay server - main entry point.
//!
//! Wires together configuration, logging, the server core, and graceful
//! shutdown handling.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::{error, info};

use chat_server::{
    config::{self, Args, ServerConfig},
    logging, shutdown, ChatServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = Instant::now();

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration first so the logging setup can honor its
    // format/level settings
    let config = config::load_config(&args)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // Initialize logging system
    logging::setup_logging(&args, config.logging.as_ref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting chat relay server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config.display());

    // Resolve runtime configuration (CLI flags win over the file)
    let server_config = config::resolve_server_config(&config, &args)?;
    log_server_configuration(&server_config);

    let server = ChatServer::new(server_config);

    // Setup shutdown handler
    let shutdown_receiver = shutdown::setup_shutdown_handler().await;

    info!("Startup complete in {:.2?}", startup_start.elapsed());

    // Run the server and wait for shutdown
    tokio::select! {
        result = server.start() => {
            match result {
                Ok(_) => info!("Server stopped normally"),
                Err(e) => {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_receiver => {
            let shutdown_start = Instant::now();
            info!("Shutdown signal received");
            if let Err(e) = server.shutdown().await {
                error!("Error during shutdown: {}", e);
            }
            info!("Server shutdown completed in {:.2?}", shutdown_start.elapsed());
        }
    }

    Ok(())
}

/// Log the final server configuration.
fn log_server_configuration(config: &ServerConfig) {
    info!("Server configuration:");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);
    info!("  Use reuse port: {}", config.use_reuse_port);
}
