//! TCP role negotiation: dial first, listen if the dial fails.
//!
//! The listening socket is created with `SO_REUSEADDR` so a restarted peer
//! can rebind its port while the previous connection is still in
//! `TIME_WAIT`.  Only one pending connection is queued (`listen(1)`): the
//! protocol has exactly two peers.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use clipsync_core::{Role, WireFormat};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::link::LinkChannel;
use crate::application::negotiation::{NegotiationError, Negotiator};
use crate::infrastructure::network::link::{tcp_link, LinkLimits};

/// Default bound on one dial attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Addresses and wire settings for one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationConfig {
    /// Where this instance listens when it becomes the listener.
    pub local_addr: SocketAddr,
    /// Where this instance dials.
    pub remote_addr: SocketAddr,
    /// Bound on one dial attempt.
    pub connect_timeout: Duration,
    /// Wire format used on the established link.
    pub wire_format: WireFormat,
    /// Size limits used on the established link.
    pub limits: LinkLimits,
}

/// Negotiates roles over TCP.
#[derive(Debug, Clone)]
pub struct TcpNegotiator {
    config: NegotiationConfig,
}

impl TcpNegotiator {
    /// Creates a negotiator for `config`.
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    /// Runs one negotiation and returns the role taken with its connection.
    ///
    /// # Errors
    ///
    /// See [`NegotiationError`]; dial failures are never errors, they only
    /// switch this instance to listening.
    pub async fn negotiate_stream(
        &self,
        accept_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(Role, TcpStream), NegotiationError> {
        if let Some(stream) = self.dial(cancel).await? {
            return Ok((Role::Dialer, stream));
        }
        let stream = self.listen(accept_timeout, cancel).await?;
        Ok((Role::Listener, stream))
    }

    /// One bounded connect attempt.  `Ok(None)` means "become the listener".
    async fn dial(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<TcpStream>, NegotiationError> {
        let remote = self.config.remote_addr;
        info!("attempting to connect to {remote}");

        let attempt = time::timeout(self.config.connect_timeout, TcpStream::connect(remote));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NegotiationError::Cancelled),
            r = attempt => r,
        };

        match result {
            Ok(Ok(stream)) => {
                info!("connected to {remote} as dialer");
                Ok(Some(stream))
            }
            Ok(Err(e)) => {
                info!("connection to {remote} failed ({e}); switching to listener");
                Ok(None)
            }
            Err(_) => {
                info!(
                    "connection to {remote} timed out after {:?}; switching to listener",
                    self.config.connect_timeout
                );
                Ok(None)
            }
        }
    }

    async fn listen(
        &self,
        accept_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<TcpStream, NegotiationError> {
        let addr = self.config.local_addr;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|source| NegotiationError::Bind { addr, source })?;
        socket
            .set_reuseaddr(true)
            .map_err(|source| NegotiationError::Bind { addr, source })?;
        socket
            .bind(addr)
            .map_err(|source| NegotiationError::Bind { addr, source })?;
        let listener = socket
            .listen(1)
            .map_err(|source| NegotiationError::Listen { addr, source })?;

        info!("listening on {addr}");

        let accept = async {
            match accept_timeout {
                Some(limit) => time::timeout(limit, listener.accept())
                    .await
                    .map_err(|_| NegotiationError::AcceptTimeout(limit))?,
                None => listener.accept().await,
            }
            .map_err(|source| NegotiationError::Accept { addr, source })
        };

        let (stream, peer) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(NegotiationError::Cancelled),
            r = accept => r?,
        };

        if peer.ip() != self.config.remote_addr.ip() {
            warn!(
                "accepted connection from {peer}, expected {}; continuing anyway",
                self.config.remote_addr.ip()
            );
        }
        info!("accepted connection from {peer} as listener");
        Ok(stream)
    }
}

#[async_trait]
impl Negotiator for TcpNegotiator {
    async fn negotiate(
        &self,
        accept_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<LinkChannel, NegotiationError> {
        let (role, stream) = self.negotiate_stream(accept_timeout, cancel).await?;
        Ok(tcp_link(stream, role, self.config.wire_format, self.config.limits))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
