//! End-to-end clipboard sync between two supervised peers on loopback TCP.
//!
//! # Purpose
//!
//! Each test runs two complete peers (negotiator, supervisor, sync engine)
//! inside one process.  The clipboards are `MemoryClipboard`s, so a test
//! "copies" text with `set` and checks what the other side received with
//! `get` and `writes`.
//!
//! Polling runs every 20 ms to keep the tests fast; every assertion on the
//! remote side waits with a deadline instead of a fixed sleep.
//!
//! # Startup exchange
//!
//! Both peers start with an empty clipboard and an unset snapshot, so each
//! sends `""` once at startup.  The tests ignore `""` when counting writes.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clipsync_core::WireFormat;
use clipsync_peer::application::supervisor::{Supervisor, SupervisorConfig, SupervisorError};
use clipsync_peer::infrastructure::clipboard::MemoryClipboard;
use clipsync_peer::infrastructure::network::{LinkLimits, NegotiationConfig, TcpNegotiator};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ── Helpers ───────────────────────────────────────────────────────────────────

const POLL: Duration = Duration::from_millis(20);
const DEADLINE: Duration = Duration::from_secs(5);

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn supervisor_config(reconnect: bool) -> SupervisorConfig {
    SupervisorConfig {
        poll_interval: POLL,
        accept_timeout: None,
        reconnect,
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(200),
        rejoin_accept_timeout: Duration::from_millis(200),
    }
}

/// One running peer.
struct Peer {
    clipboard: Arc<MemoryClipboard>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), SupervisorError>>,
}

fn spawn_peer(
    local_port: u16,
    remote_port: u16,
    clipboard: Arc<MemoryClipboard>,
    reconnect: bool,
) -> Peer {
    let lo = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let negotiator = TcpNegotiator::new(NegotiationConfig {
        local_addr: SocketAddr::new(lo, local_port),
        remote_addr: SocketAddr::new(lo, remote_port),
        connect_timeout: Duration::from_millis(500),
        wire_format: WireFormat::Framed,
        limits: LinkLimits::default(),
    });
    let supervisor = Supervisor::new(negotiator, clipboard.clone(), supervisor_config(reconnect));
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move { supervisor.run(&token).await });
    Peer {
        clipboard,
        cancel,
        task,
    }
}

/// Starts X, lets it fall back to listening, then starts Y.
async fn spawn_pair(reconnect: bool) -> (Peer, Peer, u16, u16) {
    let (port_x, port_y) = (free_port(), free_port());
    let x = spawn_peer(port_x, port_y, Arc::new(MemoryClipboard::new()), reconnect);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let y = spawn_peer(port_y, port_x, Arc::new(MemoryClipboard::new()), reconnect);
    (x, y, port_x, port_y)
}

async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn wait_for_text(clipboard: &MemoryClipboard, expected: &str) -> bool {
    eventually(|| async { clipboard.get() == expected }).await
}

fn count_writes(clipboard: &MemoryClipboard, value: &str) -> usize {
    clipboard.writes().iter().filter(|w| w.as_str() == value).count()
}

async fn shutdown(peer: Peer) -> Result<(), SupervisorError> {
    peer.cancel.cancel();
    peer.task.await.expect("supervisor task panicked")
}

// ── Scenario B/C ──────────────────────────────────────────────────────────────

/// A value copied on X appears on Y, and a value copied on Y appears on X.
#[tokio::test]
async fn test_values_flow_in_both_directions() {
    // Arrange
    let (x, y, _, _) = spawn_pair(false).await;

    // Act / Assert: X → Y
    x.clipboard.set("hello");
    assert!(wait_for_text(&y.clipboard, "hello").await, "Y never received hello");

    // Act / Assert: Y → X
    y.clipboard.set("world");
    assert!(wait_for_text(&x.clipboard, "world").await, "X never received world");

    shutdown(x).await.expect("X shuts down cleanly");
    shutdown(y).await.ok();
}

/// A received value is applied once and never sent back to its origin.
#[tokio::test]
async fn test_applied_value_is_not_echoed_back() {
    // Arrange
    let (x, y, _, _) = spawn_pair(false).await;

    // Act
    x.clipboard.set("hello");
    assert!(wait_for_text(&y.clipboard, "hello").await);
    // Many poll cycles on both sides.
    tokio::time::sleep(POLL * 15).await;

    // Assert
    assert_eq!(count_writes(&y.clipboard, "hello"), 1);
    assert_eq!(count_writes(&x.clipboard, "hello"), 0, "hello echoed back to X");

    shutdown(x).await.ok();
    shutdown(y).await.ok();
}

/// Distinct successive values each arrive once, in order.
#[tokio::test]
async fn test_successive_values_arrive_in_order() {
    let (x, y, _, _) = spawn_pair(false).await;

    for value in ["one", "two", "three"] {
        x.clipboard.set(value);
        assert!(wait_for_text(&y.clipboard, value).await, "Y never received {value}");
    }

    let received: Vec<String> = y
        .clipboard
        .writes()
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect();
    assert_eq!(received, vec!["one", "two", "three"]);

    shutdown(x).await.ok();
    shutdown(y).await.ok();
}

/// Clearing the clipboard after a non-empty value propagates the empty string.
#[tokio::test]
async fn test_empty_string_propagates_after_non_empty_value() {
    let (x, y, _, _) = spawn_pair(false).await;

    x.clipboard.set("temporary");
    assert!(wait_for_text(&y.clipboard, "temporary").await);

    x.clipboard.set("");

    assert!(wait_for_text(&y.clipboard, "").await, "Y never received the empty value");

    shutdown(x).await.ok();
    shutdown(y).await.ok();
}

/// A value larger than one TCP segment arrives intact in the framed format.
#[tokio::test]
async fn test_large_value_arrives_intact() {
    let (x, y, _, _) = spawn_pair(false).await;
    let big = "0123456789abcdef".repeat(64 * 1024); // 1 MiB

    x.clipboard.set(big.clone());

    assert!(wait_for_text(&y.clipboard, &big).await);

    shutdown(x).await.ok();
    shutdown(y).await.ok();
}

// ── Scenario D ────────────────────────────────────────────────────────────────

/// When one peer goes away the other notices, stops cleanly and
/// propagates nothing further.
#[tokio::test]
async fn test_peer_loss_ends_session_without_reconnect() {
    // Arrange
    let (x, y, _, _) = spawn_pair(false).await;
    x.clipboard.set("before");
    assert!(wait_for_text(&y.clipboard, "before").await);
    let y_clipboard = y.clipboard.clone();

    // Act: X shuts down gracefully; Y loses its link.
    let x_clipboard = x.clipboard.clone();
    shutdown(x).await.expect("X exits with Ok after cancel");
    let y_result = tokio::time::timeout(DEADLINE, y.task)
        .await
        .expect("Y stops on its own")
        .expect("Y task panicked");

    // Assert
    assert!(matches!(y_result, Err(SupervisorError::LinkLost(_))));
    x_clipboard.set("after");
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(y_clipboard.get(), "before");
}

/// Cancelling a peer that is still waiting for the other side exits with Ok.
#[tokio::test]
async fn test_cancel_while_listening_exits_cleanly() {
    let x = spawn_peer(free_port(), free_port(), Arc::new(MemoryClipboard::new()), true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = tokio::time::timeout(DEADLINE, shutdown(x)).await.expect("shutdown hangs");

    assert!(result.is_ok());
}

// ── Reconnect ─────────────────────────────────────────────────────────────────

/// With reconnect enabled, a restarted peer is picked up again and sync
/// resumes.
#[tokio::test]
async fn test_restarted_peer_is_reconnected() {
    // Arrange: a synced pair.
    let (x, y, port_x, port_y) = spawn_pair(true).await;
    x.clipboard.set("first");
    assert!(wait_for_text(&y.clipboard, "first").await);

    // Act: stop X, then start a fresh X on the same ports.
    shutdown(x).await.expect("X exits with Ok");
    tokio::time::sleep(Duration::from_millis(100)).await;
    let x2 = spawn_peer(port_x, port_y, Arc::new(MemoryClipboard::new()), true);
    x2.clipboard.set("second");

    // Assert
    assert!(
        wait_for_text(&y.clipboard, "second").await,
        "sync did not resume after reconnect"
    );

    shutdown(x2).await.ok();
    shutdown(y).await.expect("Y exits with Ok after cancel");
}
