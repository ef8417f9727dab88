//! Configuration settings structures.
//!
//! This module defines the configuration structures used by the server:
//! the TOML-backed `Config` read from the configuration file, and the
//! resolved `ServerConfig` consumed at runtime.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration structure.
///
/// This is the root configuration object that contains all server
/// settings. It can be serialized to/from TOML format for configuration
/// files.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Server-specific settings
    pub server: ServerSettings,
    /// Optional logging configuration
    pub logging: Option<LoggingSettings>,
}

/// Server configuration settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerSettings {
    /// Network address to bind the server to
    ///
    /// Format: "IP:PORT" (e.g., "127.0.0.1:7878" for localhost,
    /// "0.0.0.0:7878" for all interfaces)
    pub listen_addr: String,

    /// Maximum number of concurrent client connections
    ///
    /// Clients connecting past this limit are told the chat is full and
    /// disconnected. 0 disables the limit.
    pub max_connections: usize,

    /// Whether to use SO_REUSEPORT for multi-threaded accept loops
    pub use_reuse_port: bool,
}

/// Logging system configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Logging level filter
    ///
    /// Valid values: "trace", "debug", "info", "warn", "error".
    pub level: String,

    /// Enable JSON-formatted log output
    ///
    /// When true, logs are output in structured JSON format, useful for
    /// log aggregation systems.
    pub json_format: bool,
}

/// Resolved runtime configuration for the chat server.
///
/// Built from the TOML [`Config`] with CLI overrides applied; this is
/// what [`ChatServer`](crate::server::ChatServer) consumes.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub listen_addr: SocketAddr,

    /// Maximum number of concurrent connections allowed (0 = unlimited)
    pub max_connections: usize,

    /// Whether to use SO_REUSEPORT for multi-threaded accept loops
    pub use_reuse_port: bool,
}

impl Default for Config {
    /// Create a default configuration suitable for development.
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_addr: "127.0.0.1:7878".to_string(),
                max_connections: 1000,
                use_reuse_port: false,
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}
