//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! identity assignment, per-connection metadata, and the shared registry
//! used for message broadcast.

pub mod client;
pub mod registry;

pub use client::ClientConnection;
pub use registry::ConnectionRegistry;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server. The registry keys on identity
/// rather than display name, so two clients that pick the same name
/// remain distinct.
pub type ConnectionId = usize;
