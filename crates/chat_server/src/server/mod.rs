//! Server orchestration.
//!
//! This module contains the main `ChatServer` struct (listener setup,
//! accept loops, shutdown coordination) and the per-connection handler.

pub mod core;
pub mod handlers;

pub use core::ChatServer;
pub use handlers::handle_connection;
