//! Client connection representation.
//!
//! This module defines the structure describing an individual client
//! connection held in the registry: the display name, the write half of
//! the socket, and connection metadata.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

/// Shared, serialized write half of a client connection.
///
/// Every other connection's task may broadcast into this stream at any
/// time, so it lives behind a `Mutex`: one writer at a time per output,
/// which keeps each delivered line whole on the wire. The stream is boxed
/// so tests can register in-memory streams in place of TCP write halves.
pub type ClientWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Represents an individual client connection to the server.
///
/// This structure tracks the essential information about a connected
/// client: the display name taken verbatim from the client's first line,
/// the write half used for message delivery, the remote address, and the
/// connection timestamp.
#[derive(Clone)]
pub struct ClientConnection {
    /// Display name chosen by the client in the handshake line
    pub name: String,

    /// Serialized write half of the client's stream
    pub writer: ClientWriter,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,
}

impl ClientConnection {
    /// Creates a new client connection with the given name and write half.
    ///
    /// The connection records the current time as its connection timestamp
    /// and wraps the writer for shared, serialized access.
    pub fn new(
        name: String,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            name,
            writer: Arc::new(Mutex::new(writer)),
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }
}

impl fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection")
            .field("name", &self.name)
            .field("remote_addr", &self.remote_addr)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
