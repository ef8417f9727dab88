//! Error types for the chat server.
//!
//! Failures on an individual connection are never surfaced as errors to
//! other connections or to the process; the variants here cover server
//! startup and the registry's capacity check.

use thiserror::Error;

/// Errors produced by the chat server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Network-level failure during listener setup (socket creation,
    /// bind, listen).
    #[error("Network error: {0}")]
    Network(String),

    /// I/O failure on an individual stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry refused a registration because the chat is full.
    #[error("connection limit reached ({0} active)")]
    Capacity(usize),

    /// Internal invariant failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
