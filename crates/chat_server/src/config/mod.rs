//! Configuration module for the chat server.
//!
//! This module handles command-line arguments, configuration file
//! parsing, and provides default settings for the server.

pub mod args;
pub mod settings;

pub use args::Args;
pub use settings::{Config, LoggingSettings, ServerConfig, ServerSettings};

use anyhow::Result;
use tracing::{info, warn};

/// Load configuration from file or create default configuration.
///
/// This function attempts to load configuration from the specified file.
/// If the file doesn't exist, it creates a default configuration file and
/// returns the default settings.
///
/// # Errors
/// * Returns error if file I/O operations fail
/// * Returns error if TOML parsing fails
pub async fn load_config(args: &Args) -> Result<Config> {
    if args.config.exists() {
        let config_str = tokio::fs::read_to_string(&args.config).await?;
        match toml::de::from_str::<Config>(&config_str) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Failed to parse config file {}: {}", args.config.display(), e);
                Err(e.into())
            }
        }
    } else {
        warn!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );

        // Create default config file
        let default_config = Config::default();
        let config_str = toml::to_string_pretty(&default_config)?;
        tokio::fs::write(&args.config, config_str).await?;
        info!("Created default configuration file: {}", args.config.display());

        Ok(default_config)
    }
}

/// Resolve the runtime server configuration from the loaded config file
/// and CLI overrides.
///
/// CLI flags win over file settings.
pub fn resolve_server_config(config: &Config, args: &Args) -> Result<ServerConfig> {
    let listen_addr = args
        .listen
        .as_deref()
        .unwrap_or(&config.server.listen_addr)
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse listen address: {}", e))?;

    let max_connections = args.max_connections.unwrap_or(config.server.max_connections);

    Ok(ServerConfig {
        listen_addr,
        max_connections,
        use_reuse_port: config.server.use_reuse_port,
    })
}
