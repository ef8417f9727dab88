//! # Chat Server - Line-Oriented Broadcast Relay
//!
//! A small TCP chat relay: clients connect, send their display name as the
//! first line, and every subsequent newline-terminated line is rebroadcast
//! verbatim to every other connected client. One room, no history, no
//! accounts.
//!
//! ## Architecture Overview
//!
//! * **Connection registry** - the single shared set of active
//!   connections, the only cross-connection coupling in the system
//! * **Per-connection handlers** - one task per client owning that
//!   client's read loop for its entire lifetime
//! * **Server core** - listener setup, accept loops, and shutdown
//!   coordination
//!
//! ## Message Flow
//!
//! 1. A client connects and sends its display name as the first line
//! 2. The handler registers the connection and announces the join
//! 3. Each subsequent non-empty line is broadcast to every other member
//! 4. On disconnect or error the handler unregisters and announces the
//!    departure
//!
//! ## Error Handling
//!
//! No failure on one connection can affect another or terminate the
//! process. A peer that fails a broadcast write is torn down by the
//! broadcasting task after the delivery pass; everyone else still gets
//! the message.
//!
//! ## Thread Safety
//!
//! The registry's member set is guarded by an `RwLock` and broadcast
//! snapshots the membership before writing to any socket, so the set is
//! never iterated while a mutation is in progress. Each connection's
//! output stream is serialized behind its own mutex so concurrent
//! broadcasters cannot interleave partial lines.

// Re-export core types and functions for easy access
pub use config::{Args, Config, ServerConfig};
pub use connection::{ClientConnection, ConnectionId, ConnectionRegistry};
pub use error::ServerError;
pub use server::ChatServer;

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod server;
pub mod shutdown;
