//! Negotiator: the seam between the session supervisor and role negotiation.
//!
//! # How do two identical peers pick roles? (for beginners)
//!
//! Both machines run the same command with their own IP first and the
//! other's IP second.  Each one first tries to *dial* the other.  If nobody
//! is listening yet the dial fails, so that instance opens a listening socket
//! and waits.  When the second machine starts, its dial finds the listener
//! and succeeds.  Whoever started second therefore usually becomes the
//! dialer, but nothing is configured: roles emerge from timing.
//!
//! The TCP implementation is `infrastructure::network::negotiator::TcpNegotiator`.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::application::link::LinkChannel;

/// Error type for role negotiation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The listening socket could not be bound to the local address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The bound socket could not be put into listening mode.
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Waiting for the incoming connection failed.
    #[error("failed to accept a connection on {addr}: {source}")]
    Accept {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// No peer dialed in before the accept timeout.
    #[error("no peer connected within {0:?}")]
    AcceptTimeout(Duration),
    /// Shutdown was requested while negotiating.
    #[error("negotiation cancelled")]
    Cancelled,
}

impl NegotiationError {
    /// Returns `true` for errors that point at a bad local address.
    ///
    /// The supervisor treats these as final only before the first session;
    /// later they can be caused by the address vanishing in a network drop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NegotiationError::Bind { .. } | NegotiationError::Listen { .. })
    }
}

/// Produces an established [`LinkChannel`] to the peer.
#[async_trait]
pub trait Negotiator: Send + Sync {
    /// Runs one dial-then-listen negotiation.
    ///
    /// `accept_timeout` bounds the listening phase; `None` waits forever.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError`] if no connection could be established.
    async fn negotiate(
        &self,
        accept_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<LinkChannel, NegotiationError>;
}
