//! Core chat server implementation.
//!
//! This module contains the main `ChatServer` struct and its
//! implementation: listener setup, the accept loops that spawn one handler
//! task per connection, and shutdown coordination.

use crate::{
    config::ServerConfig,
    connection::ConnectionRegistry,
    error::ServerError,
    server::handlers::handle_connection,
};
use futures::stream::{FuturesUnordered, StreamExt as FuturesStreamExt};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// The core chat server structure.
///
/// `ChatServer` owns the shared [`ConnectionRegistry`] and the accept
/// loops that feed it. The registry is created once here and handed to
/// every connection handler at spawn time, so the server's lifecycle is
/// the registry's lifecycle.
///
/// # Architecture
///
/// * **Connection registry**: the single shared set of active connections
/// * **Per-connection tasks**: each accepted socket runs its own handler
/// * **Multi-threaded networking**: configurable accept loop scaling via
///   SO_REUSEPORT
pub struct ChatServer {
    /// Server configuration settings
    config: ServerConfig,

    /// The shared registry of active connections
    registry: Arc<ConnectionRegistry>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl ChatServer {
    /// Creates a new chat server with the specified configuration.
    ///
    /// The registry is constructed here with the configured connection
    /// cap; the server is ready to start after construction.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.max_connections));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            registry,
            shutdown_sender,
        }
    }

    /// Gets a handle to the shared connection registry.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Starts the server and begins accepting connections.
    ///
    /// Binds one or more TCP listeners (multiple when `use_reuse_port` is
    /// enabled, one per CPU core), then runs the accept loops until an
    /// accept error or a shutdown signal. Each accepted connection is
    /// handed to its own spawned handler task together with a clone of
    /// the registry.
    pub async fn start(&self) -> Result<(), ServerError> {
        info!("🚀 Starting chat server on {}", self.config.listen_addr);

        let core_count = num_cpus::get();
        let num_acceptors = if self.config.use_reuse_port {
            core_count
        } else {
            1
        };

        info!(
            "🧠 Detected {} CPU cores, using {} acceptor(s)",
            core_count, num_acceptors
        );

        let mut listeners = Vec::new();
        for i in 0..num_acceptors {
            let listener = self.create_listener()?;
            info!("✅ Listener {} bound on {}", i, self.config.listen_addr);
            listeners.push(listener);
        }

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let mut accept_futures = listeners
            .into_iter()
            .map(|listener| {
                let registry = self.registry.clone();

                async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, addr)) => {
                                let registry = registry.clone();

                                // One task per connection, for the
                                // connection's entire lifetime.
                                tokio::spawn(async move {
                                    handle_connection(stream, addr, registry).await;
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {}", e);
                                break;
                            }
                        }
                    }
                }
            })
            .collect::<FuturesUnordered<_>>();

        tokio::select! {
            _ = accept_futures.next() => {}
            _ = shutdown_receiver.recv() => {
                info!("Shutdown signal received");
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Builds one TCP listener for the configured address.
    ///
    /// SO_REUSEADDR is always set; SO_REUSEPORT is set when configured so
    /// multiple acceptors can share the port and the kernel balances
    /// incoming connections across them.
    fn create_listener(&self) -> Result<TcpListener, ServerError> {
        let domain = Domain::for_address(self.config.listen_addr);
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::Network(format!("Socket creation failed: {e}")))?;
        socket.set_reuse_address(true).ok();

        if self.config.use_reuse_port {
            #[cfg(unix)]
            {
                if let Err(e) = socket.set_reuse_port(true) {
                    warn!("Failed to set SO_REUSEPORT: {}", e);
                }
            }
            #[cfg(not(unix))]
            {
                warn!("SO_REUSEPORT is not supported on this platform, using a single effective acceptor");
            }
        }

        socket
            .bind(&self.config.listen_addr.into())
            .map_err(|e| ServerError::Network(format!("Bind failed: {e}")))?;

        socket
            .listen(1024)
            .map_err(|e| ServerError::Network(format!("Listen failed: {e}")))?;

        let std_listener: StdTcpListener = socket.into();
        std_listener.set_nonblocking(true).ok();

        TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::Network(format!("Tokio listener creation failed: {e}")))
    }

    /// Initiates server shutdown.
    ///
    /// Signals the accept loops to stop. In-flight connection tasks are
    /// dropped with the runtime.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }
}
