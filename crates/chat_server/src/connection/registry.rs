//! The shared connection registry and broadcast fan-out.
//!
//! The registry is the single piece of state shared between connection
//! tasks. It is constructed once at server start and injected into every
//! handler; membership reads and writes are serialized through one
//! `RwLock`, and broadcast takes a snapshot of the member set before
//! touching any socket so the map is never iterated during a mutation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{ClientConnection, ConnectionId};
use crate::error::ServerError;

/// Prefix for server-originated control lines (join/leave announcements
/// and capacity refusals), so clients can tell them from relayed chat.
pub const SERVER_PREFIX: &str = "SERVER: ";

/// The join announcement broadcast when a client completes its handshake.
pub fn join_notice(name: &str) -> String {
    format!("{SERVER_PREFIX}{name} has entered the chat!")
}

/// The departure announcement broadcast when a client leaves or fails.
pub fn departure_notice(name: &str) -> String {
    format!("{SERVER_PREFIX}{name} has left")
}

/// The refusal line written to a client that hit the connection cap.
pub fn full_notice() -> String {
    format!("{SERVER_PREFIX}the chat is full")
}

/// Thread-safe registry of active client connections.
///
/// A connection appears in the registry exactly while it is active: it is
/// inserted by [`register`](Self::register) once the client's name has
/// been read, and removed by [`unregister`](Self::unregister) on teardown,
/// whether that teardown was triggered by the connection's own read loop
/// or by a failed broadcast write.
pub struct ConnectionRegistry {
    /// Active connections keyed by identity
    connections: RwLock<HashMap<ConnectionId, ClientConnection>>,

    /// Source of unique connection identifiers
    next_id: AtomicUsize,

    /// Maximum number of concurrent connections; 0 disables the cap
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry with the given connection cap.
    ///
    /// A `max_connections` of 0 means unlimited.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            max_connections,
        }
    }

    /// Adds a connection to the active set and returns its assigned id.
    ///
    /// No duplicate-name check is performed; names are labels, not keys.
    /// Registration is refused with [`ServerError::Capacity`] when the
    /// configured cap is reached, in which case the caller owns the
    /// goodbye message and the socket close.
    pub async fn register(&self, conn: ClientConnection) -> Result<ConnectionId, ServerError> {
        let mut connections = self.connections.write().await;
        if self.max_connections != 0 && connections.len() >= self.max_connections {
            return Err(ServerError::Capacity(connections.len()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        connections.insert(id, conn);
        debug!(id, total = connections.len(), "connection registered");
        Ok(id)
    }

    /// Removes a connection if present, returning the removed entry.
    ///
    /// Idempotent: removing an id that is absent (never registered, or
    /// already reaped by a failed broadcast write) returns `None` and is
    /// not an error. The `Some`/`None` result doubles as the claim on the
    /// departure announcement, so each connection is announced gone at
    /// most once.
    pub async fn unregister(&self, id: ConnectionId) -> Option<ClientConnection> {
        let removed = self.connections.write().await.remove(&id);
        if removed.is_some() {
            debug!(id, "connection unregistered");
        }
        removed
    }

    /// Number of currently active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Delivers `message` (plus a line terminator) to every member except
    /// `exclude`.
    ///
    /// Members that fail the write are torn down after the delivery pass:
    /// each is unregistered and its departure announced to the survivors.
    /// Those announcements are queued and delivered iteratively rather
    /// than dispatched from inside the failing pass, so a cascade of dead
    /// peers unwinds as a loop without re-entering any lock. No error is
    /// surfaced to the caller.
    pub async fn broadcast(&self, message: &str, exclude: Option<ConnectionId>) {
        let mut queue = vec![(message.to_string(), exclude)];

        while let Some((line, excluded)) = queue.pop() {
            let failed = self.deliver(&line, excluded).await;
            for id in failed {
                if let Some(conn) = self.unregister(id).await {
                    debug!(id, name = %conn.name, "reaped after failed write");
                    queue.push((departure_notice(&conn.name), Some(id)));
                }
            }
        }
    }

    /// One delivery pass: snapshot the member set under the read lock,
    /// release it, then write to each member's serialized output.
    ///
    /// Returns the ids whose writes failed. A failure on one member never
    /// aborts delivery to the rest.
    async fn deliver(&self, line: &str, exclude: Option<ConnectionId>) -> Vec<ConnectionId> {
        let members: Vec<(ConnectionId, ClientConnection)> = {
            let connections = self.connections.read().await;
            connections
                .iter()
                .filter(|(id, _)| Some(**id) != exclude)
                .map(|(id, conn)| (*id, conn.clone()))
                .collect()
        };

        // One buffer per line so each peer gets a single write call and
        // lines can never interleave mid-line on the wire.
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut failed = Vec::new();
        for (id, conn) in members {
            let mut writer = conn.writer.lock().await;
            let result = async {
                writer.write_all(&buf).await?;
                writer.flush().await
            }
            .await;

            if let Err(e) = result {
                warn!(id, name = %conn.name, error = %e, "write failed during broadcast");
                failed.push(id);
            }
        }
        failed
    }
}
