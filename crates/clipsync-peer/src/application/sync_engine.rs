//! SyncEngine: mirrors the clipboard over one established link.
//!
//! # The two loops
//!
//! ```text
//!            ┌──────────── outbound loop ────────────┐
//! clipboard ─┤ poll every 500 ms, compare, send     ├─> link
//!            └───────────────────────────────────────┘
//!            ┌──────────── inbound loop ─────────────┐
//! clipboard <┤ compare, write                        ├── link
//!            └───────────────────────────────────────┘
//! ```
//!
//! Both loops share one [`ClipboardSnapshot`] behind an async mutex.  The lock
//! is held while the clipboard is read (outbound) or written (inbound), so a
//! local copy and a remote message can never interleave their
//! compare-and-store steps.
//!
//! When either loop ends (transport error, peer closed, cancellation) it
//! cancels the session token; the other loop notices at its next blocking
//! point and ends too.  The send half is closed once, after both loops have
//! returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clipsync_core::{ClipboardSnapshot, Observation, ProtocolError};
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::clipboard::{read_clipboard, write_clipboard, ClipboardPort};
use crate::application::link::{Delivery, LinkChannel, LinkError, LinkReceiver, LinkSender};

/// How a sync session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Shutdown was requested; the link was healthy.
    Cancelled,
    /// The link failed or the peer closed it.
    LinkLost(LinkError),
}

/// Why one loop returned.
#[derive(Debug)]
enum LoopExit {
    Cancelled,
    Failed(LinkError),
}

/// Per-session counters.
#[derive(Debug, Default)]
pub struct SyncStats {
    sent: AtomicU64,
    applied: AtomicU64,
}

impl SyncStats {
    /// Number of local changes sent to the peer.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Number of remote values written to the local clipboard.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }
}

/// The sync use case for one link session.
///
/// A new engine (and therefore a fresh, unset snapshot) is created for every
/// established link.
pub struct SyncEngine {
    clipboard: Arc<dyn ClipboardPort>,
    snapshot: Arc<Mutex<ClipboardSnapshot>>,
    poll_interval: Duration,
    stats: Arc<SyncStats>,
}

impl SyncEngine {
    /// Creates an engine with an unset snapshot.
    pub fn new(clipboard: Arc<dyn ClipboardPort>, poll_interval: Duration) -> Self {
        Self {
            clipboard,
            snapshot: Arc::new(Mutex::new(ClipboardSnapshot::new())),
            poll_interval,
            stats: Arc::new(SyncStats::default()),
        }
    }

    /// Shared handle to the snapshot, for inspection.
    pub fn snapshot(&self) -> Arc<Mutex<ClipboardSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    /// Shared handle to the session counters.
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Runs both loops over `link` until it fails or `cancel` fires.
    pub async fn run(&self, link: LinkChannel, cancel: &CancellationToken) -> SessionOutcome {
        let LinkChannel {
            mut receiver,
            mut sender,
            ..
        } = link;
        let session = cancel.child_token();

        let (outbound, inbound) = tokio::join!(
            async {
                let exit = self.outbound_loop(sender.as_mut(), &session).await;
                session.cancel();
                exit
            },
            async {
                let exit = self.inbound_loop(receiver.as_mut(), &session).await;
                session.cancel();
                exit
            },
        );

        sender.close().await;
        drop(receiver);

        match (outbound, inbound) {
            (LoopExit::Failed(e), _) | (_, LoopExit::Failed(e)) => SessionOutcome::LinkLost(e),
            (LoopExit::Cancelled, LoopExit::Cancelled) => SessionOutcome::Cancelled,
        }
    }

    /// Reads the local clipboard once and stores it in the snapshot if new.
    ///
    /// Returns the text to send, or `None` if nothing changed or the
    /// clipboard could not be read.
    pub async fn poll_local(&self) -> Option<String> {
        let mut snapshot = self.snapshot.lock().await;
        let text = match read_clipboard(&self.clipboard).await {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to read local clipboard: {e}");
                return None;
            }
        };
        match snapshot.observe(&text) {
            Observation::Unchanged => None,
            Observation::Changed { .. } => Some(text),
        }
    }

    /// Applies a value received from the peer.
    ///
    /// Returns `true` if the local clipboard was written.
    pub async fn apply_remote(&self, text: String) -> bool {
        let mut snapshot = self.snapshot.lock().await;
        let Observation::Changed { previous } = snapshot.observe(&text) else {
            debug!("remote value equals snapshot; ignoring");
            return false;
        };

        let len = text.len();
        match write_clipboard(&self.clipboard, text).await {
            Ok(()) => {
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
                info!("clipboard updated from remote ({len} bytes)");
                true
            }
            Err(e) => {
                warn!("failed to write remote value to local clipboard: {e}");
                snapshot.restore(previous);
                false
            }
        }
    }

    async fn outbound_loop(
        &self,
        sender: &mut dyn LinkSender,
        cancel: &CancellationToken,
    ) -> LoopExit {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return LoopExit::Cancelled,
                _ = ticker.tick() => {}
            }

            let Some(text) = self.poll_local().await else {
                continue;
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return LoopExit::Cancelled,
                result = sender.send(&text) => result,
            };

            match result {
                Ok(Delivery::Written) => {
                    self.stats.sent.fetch_add(1, Ordering::Relaxed);
                    info!("sent update to remote ({} bytes)", text.len());
                }
                Ok(Delivery::Skipped) => {
                    debug!("value has no encoding in this wire format; not sent");
                }
                // Rejected before any byte was written; the link is intact.
                // The snapshot keeps the value so it is not retried every tick.
                Err(LinkError::Protocol(ProtocolError::FrameTooLarge { len, max })) => {
                    warn!(
                        "local clipboard value of {len} bytes exceeds the {max} byte limit; \
                         not sent"
                    );
                }
                Err(e) => {
                    error!("failed to send clipboard update: {e}");
                    return LoopExit::Failed(e);
                }
            }
        }
    }

    async fn inbound_loop(
        &self,
        receiver: &mut dyn LinkReceiver,
        cancel: &CancellationToken,
    ) -> LoopExit {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return LoopExit::Cancelled,
                received = receiver.receive() => received,
            };

            match received {
                Ok(text) => {
                    self.apply_remote(text).await;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("dropping undecodable message from remote: {e}");
                }
                Err(LinkError::Closed) => {
                    info!("remote closed the connection");
                    return LoopExit::Failed(LinkError::Closed);
                }
                Err(e) => {
                    error!("failed to receive from remote: {e}");
                    return LoopExit::Failed(e);
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
