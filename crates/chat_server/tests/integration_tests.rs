//! Integration tests for the chat relay.
//!
//! These tests drive the full server over real TCP sockets: handshake,
//! join/leave announcements, broadcast fan-out, and the connection cap.
//! The registry stress test exercises the shared member set directly.

use std::sync::Arc;
use std::time::Duration;

use chat_server::{ChatServer, ClientConnection, ConnectionRegistry, ServerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

/// Spawns a server on the given port and waits until it accepts.
///
/// Returns the shared registry (for membership assertions) and the
/// address clients should dial.
async fn start_server(port: u16, max_connections: usize) -> (Arc<ConnectionRegistry>, String) {
    let addr = format!("127.0.0.1:{port}");
    let config = ServerConfig {
        listen_addr: addr.parse().unwrap(),
        max_connections,
        use_reuse_port: false,
    };

    let server = ChatServer::new(config);
    let registry = server.registry();
    tokio::spawn(async move {
        if let Err(e) = server.start().await {
            panic!("server failed: {e}");
        }
    });

    // Probe until the listener is up. The probe connection never sends a
    // name, so it is discarded without registering.
    for _ in 0..100 {
        if TcpStream::connect(&addr).await.is_ok() {
            return (registry, addr);
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("server on {addr} never came up");
}

/// Polls the registry until it has exactly `expected` members.
async fn wait_for_members(registry: &ConnectionRegistry, expected: usize) {
    let result = timeout(Duration::from_secs(2), async {
        loop {
            if registry.connection_count().await == expected {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "registry never reached {expected} members");
}

/// One test client: a connected socket that has sent its name line.
struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn join(addr: &str, name: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        };
        client.send(name).await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write failed");
        self.writer.flush().await.expect("flush failed");
    }

    async fn expect_line(&mut self, expected: &str) {
        let line = timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read failed")
            .expect("stream closed unexpectedly");
        assert_eq!(line, expected);
    }

    async fn expect_silence(&mut self) {
        let result = timeout(Duration::from_millis(200), self.lines.next_line()).await;
        assert!(result.is_err(), "expected silence, got {result:?}");
    }

    async fn expect_closed(&mut self) {
        let line = timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for close")
            .expect("read failed");
        assert!(line.is_none(), "expected EOF, got {line:?}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_relay_scenario() {
    let (registry, addr) = start_server(7801, 0).await;

    let mut alice = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 1).await;

    let mut bob = TestClient::join(&addr, "bob").await;
    wait_for_members(&registry, 2).await;
    alice.expect_line("SERVER: bob has entered the chat!").await;

    let mut carol = TestClient::join(&addr, "carol").await;
    wait_for_members(&registry, 3).await;
    alice.expect_line("SERVER: carol has entered the chat!").await;
    bob.expect_line("SERVER: carol has entered the chat!").await;

    // A message from bob reaches alice and carol, never bob himself.
    bob.send("hi").await;
    alice.expect_line("hi").await;
    carol.expect_line("hi").await;
    bob.expect_silence().await;

    // Carol disconnects; the survivors see exactly one departure line.
    drop(carol);
    alice.expect_line("SERVER: carol has left").await;
    bob.expect_line("SERVER: carol has left").await;
    wait_for_members(&registry, 2).await;

    // Subsequent broadcasts flow between the remaining members only.
    bob.send("still here?").await;
    alice.expect_line("still here?").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_handshake_never_registers_or_announces() {
    let (registry, addr) = start_server(7802, 0).await;

    let mut alice = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 1).await;

    // A connection that closes before sending a name must vanish without
    // a trace: no registration, no join, no departure.
    let ghost = TcpStream::connect(&addr).await.expect("connect failed");
    drop(ghost);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(registry.connection_count().await, 1);

    // The next thing alice sees is bob joining, not ghost artifacts.
    let mut bob = TestClient::join(&addr, "bob").await;
    wait_for_members(&registry, 2).await;
    alice.expect_line("SERVER: bob has entered the chat!").await;
    bob.expect_silence().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_cap_refusal() {
    let (registry, addr) = start_server(7803, 1).await;

    let _alice = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 1).await;

    // The second client is told the chat is full and disconnected; it is
    // never registered.
    let mut bob = TestClient::join(&addr, "bob").await;
    bob.expect_line("SERVER: the chat is full").await;
    bob.expect_closed().await;
    assert_eq!(registry.connection_count().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_lines_are_not_relayed() {
    let (registry, addr) = start_server(7804, 0).await;

    let mut alice = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 1).await;
    let mut bob = TestClient::join(&addr, "bob").await;
    wait_for_members(&registry, 2).await;
    alice.expect_line("SERVER: bob has entered the chat!").await;

    bob.send("").await;
    alice.expect_silence().await;

    bob.send("real message").await;
    alice.expect_line("real message").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_names_are_distinct_connections() {
    let (registry, addr) = start_server(7805, 0).await;

    let mut first = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 1).await;
    let mut second = TestClient::join(&addr, "alice").await;
    wait_for_members(&registry, 2).await;
    first.expect_line("SERVER: alice has entered the chat!").await;

    // Exclusion is by connection identity, not name: the other "alice"
    // still receives the message.
    first.send("which alice am I?").await;
    second.expect_line("which alice am I?").await;
    first.expect_silence().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_registry_stress() {
    let registry = Arc::new(ConnectionRegistry::new(0));
    let addr: std::net::SocketAddr = "127.0.0.1:0".parse().unwrap();

    let mut handles = Vec::new();
    for i in 0..50 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..10 {
                let conn = ClientConnection::new(
                    format!("user-{i}"),
                    Box::new(tokio::io::sink()),
                    addr,
                );
                let id = registry.register(conn).await.expect("register failed");
                registry
                    .broadcast(&format!("round {round} from user-{i}"), Some(id))
                    .await;
                let removed = registry.unregister(id).await;
                assert!(removed.is_some(), "lost our own registration");
            }
        }));
    }

    for handle in handles {
        handle.await.expect("stress task panicked");
    }

    // Every task removed exactly what it inserted; nothing lost, nothing
    // duplicated, no poisoned state.
    assert_eq!(registry.connection_count().await, 0);
}
