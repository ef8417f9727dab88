//! Per-connection handler.
//!
//! Each accepted socket gets one task running [`handle_connection`] for the
//! connection's entire lifetime. The handler moves through three phases:
//! reading the handshake line (the display name), relaying chat lines, and
//! teardown. The shared registry is the only coupling to other connections.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::connection::registry::{departure_notice, full_notice, join_notice};
use crate::connection::{ClientConnection, ConnectionRegistry};
use crate::error::ServerError;

/// Runs one client connection from accept to close.
///
/// The first line the client sends is taken verbatim as its display name.
/// Once the name is read the connection is registered and announced; every
/// subsequent non-empty line is rebroadcast verbatim to all other members.
/// End-of-stream or any read error ends the connection.
///
/// Errors never escape this function: a connection failure is an event for
/// this one client, not something that can take down a sibling task or the
/// accept loop.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
) {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // Handshake: a stream that ends or errors before the name arrives is
    // discarded without ever registering or announcing.
    let name = match lines.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => {
            debug!(%addr, "connection closed before name handshake");
            return;
        }
        Err(e) => {
            debug!(%addr, error = %e, "name handshake failed");
            return;
        }
    };

    let conn = ClientConnection::new(name.clone(), Box::new(write_half), addr);
    let writer = conn.writer.clone();

    let id = match registry.register(conn).await {
        Ok(id) => id,
        Err(ServerError::Capacity(active)) => {
            warn!(%addr, active, "refusing connection, chat is full");
            let mut writer = writer.lock().await;
            let _ = writer.write_all(format!("{}\n", full_notice()).as_bytes()).await;
            let _ = writer.flush().await;
            let _ = writer.shutdown().await;
            return;
        }
        Err(e) => {
            warn!(%addr, error = %e, "failed to register connection");
            return;
        }
    };

    info!(%addr, name = %name, id, "client joined");
    registry.broadcast(&join_notice(&name), Some(id)).await;

    // Active phase: the line read blocks only this task.
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                registry.broadcast(&line, Some(id)).await;
            }
            Ok(None) => {
                info!(%addr, name = %name, id, "client disconnected");
                break;
            }
            Err(e) => {
                warn!(%addr, name = %name, id, error = %e, "read failed, dropping client");
                break;
            }
        }
    }

    // Teardown. If a failed broadcast write already reaped this connection
    // the removal comes back `None` and the departure was announced by the
    // reaper; otherwise this task owns the announcement.
    if let Some(conn) = registry.unregister(id).await {
        registry.broadcast(&departure_notice(&conn.name), Some(id)).await;

        let mut writer = conn.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!(%addr, error = %e, "error closing client stream");
        }
    }
}
