//! Supervisor: negotiate, sync, and renegotiate after link loss.
//!
//! # Session lifecycle
//!
//! ```text
//! loop
//!  ├─ Negotiator::negotiate()      -- dial, else listen
//!  ├─ SyncEngine::run()            -- until link loss or shutdown
//!  └─ link lost?
//!       ├─ reconnect disabled      -> return the error
//!       └─ reconnect enabled       -> back off, renegotiate
//! ```
//!
//! After a lost session both peers may renegotiate at the same moment; if
//! both dials fail they would both listen forever.  Renegotiation therefore
//! uses a jittered accept timeout so one of them gives up listening first and
//! dials the other.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::clipboard::ClipboardPort;
use crate::application::link::LinkError;
use crate::application::negotiation::{NegotiationError, Negotiator};
use crate::application::sync_engine::{SessionOutcome, SyncEngine};

/// Error type returned when the supervisor gives up.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// No link could be negotiated.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),
    /// The link was lost and reconnecting is disabled.
    #[error("link to peer lost: {0}")]
    LinkLost(#[source] LinkError),
}

/// Supervisor settings.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Local clipboard polling interval.
    pub poll_interval: Duration,
    /// Accept timeout for the first negotiation; `None` waits forever.
    pub accept_timeout: Option<Duration>,
    /// Renegotiate after a lost link instead of returning.
    pub reconnect: bool,
    /// First delay before renegotiating.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
    /// Base accept timeout when renegotiating; jitter of up to the same
    /// amount is added.
    pub rejoin_accept_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: clipsync_core::protocol::messages::DEFAULT_POLL_INTERVAL,
            accept_timeout: None,
            reconnect: true,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            rejoin_accept_timeout: Duration::from_secs(5),
        }
    }
}

/// Doubling delay with an upper bound.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Creates a backoff starting at `initial` and capped at `max`.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the delay to wait now and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Starts over from the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Returns `base` plus a random extra in `[0, base)`.
fn jittered(base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    if base_ms == 0 {
        return base;
    }
    let extra = (Uuid::new_v4().as_u128() % u128::from(base_ms)) as u64;
    base + Duration::from_millis(extra)
}

/// Sleeps for `delay`; returns `false` if cancelled first.
async fn wait(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = time::sleep(delay) => true,
    }
}

/// The session supervisor.
pub struct Supervisor<N> {
    negotiator: N,
    clipboard: Arc<dyn ClipboardPort>,
    config: SupervisorConfig,
}

impl<N: Negotiator> Supervisor<N> {
    /// Creates a supervisor.
    pub fn new(negotiator: N, clipboard: Arc<dyn ClipboardPort>, config: SupervisorConfig) -> Self {
        Self {
            negotiator,
            clipboard,
            config,
        }
    }

    /// Runs sessions until shutdown or an unrecoverable failure.
    ///
    /// Returns `Ok(())` when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError`] on a fatal negotiation error before the
    /// first session, or on any negotiation error or link loss when
    /// reconnecting is disabled.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), SupervisorError> {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut accept_timeout = self.config.accept_timeout;
        // Bind and listen errors are configuration mistakes only until a
        // session has worked once; after that they follow network changes.
        let mut established = false;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let link = match self.negotiator.negotiate(accept_timeout, cancel).await {
                Ok(link) => link,
                Err(NegotiationError::Cancelled) => return Ok(()),
                Err(e) if (e.is_fatal() && !established) || !self.config.reconnect => {
                    error!("negotiation failed: {e}");
                    return Err(e.into());
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!("negotiation failed: {e}; retrying in {delay:?}");
                    if !wait(delay, cancel).await {
                        return Ok(());
                    }
                    continue;
                }
            };
            backoff.reset();
            established = true;

            let span = info_span!(
                "session",
                id = %link.session_id,
                role = %link.role,
                peer = %link.peer,
            );
            let engine = SyncEngine::new(Arc::clone(&self.clipboard), self.config.poll_interval);
            let outcome = async {
                info!("link established; clipboard sync running");
                let outcome = engine.run(link, cancel).await;
                let stats = engine.stats();
                info!(sent = stats.sent(), applied = stats.applied(), "session ended");
                outcome
            }
            .instrument(span)
            .await;

            match outcome {
                SessionOutcome::Cancelled => return Ok(()),
                SessionOutcome::LinkLost(e) if !self.config.reconnect => {
                    error!("link lost: {e}");
                    return Err(SupervisorError::LinkLost(e));
                }
                SessionOutcome::LinkLost(e) => {
                    let delay = backoff.next_delay();
                    warn!("link lost: {e}; renegotiating in {delay:?}");
                    accept_timeout = Some(jittered(self.config.rejoin_accept_timeout));
                    if !wait(delay, cancel).await {
                        return Ok(());
                    }
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
