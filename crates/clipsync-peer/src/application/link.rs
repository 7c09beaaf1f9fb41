//! LinkChannel: the single established connection to the peer, as seen by
//! the sync engine.
//!
//! The channel is split into a [`LinkReceiver`] (owned by the inbound loop)
//! and a [`LinkSender`] (owned by the outbound loop) so that both loops can
//! run at the same time without sharing a lock on the socket.  The concrete
//! stream-backed implementations are in `infrastructure::network::link`.

use async_trait::async_trait;
use clipsync_core::{ProtocolError, Role};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the link channel.
#[derive(Debug, Error)]
pub enum LinkError {
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The peer closed the connection (zero-length read at a message boundary).
    #[error("connection closed by peer")]
    Closed,
    /// A message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl LinkError {
    /// Returns `true` if the link is still usable after this error.
    ///
    /// Only a payload that is not valid UTF-8 qualifies: the message is
    /// dropped but the byte stream is still in sync.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinkError::Protocol(ProtocolError::InvalidUtf8(_)))
    }
}

/// Receiving half of the link.
#[async_trait]
pub trait LinkReceiver: Send {
    /// Waits for the next complete clipboard value from the peer.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] when the peer has closed the connection.
    async fn receive(&mut self) -> Result<String, LinkError>;
}

/// What a successful [`LinkSender::send`] did with the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The value was written to the connection.
    Written,
    /// The wire format has no encoding for the value (an empty value in the
    /// raw format); nothing was written.
    Skipped,
}

/// Sending half of the link.
#[async_trait]
pub trait LinkSender: Send {
    /// Sends one clipboard value as one message.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the write fails or the sender was closed.
    /// [`ProtocolError::FrameTooLarge`] is raised before anything is
    /// written, so the connection stays usable after it.
    async fn send(&mut self, text: &str) -> Result<Delivery, LinkError>;

    /// Shuts down the write direction.  Calling it again does nothing.
    async fn close(&mut self);
}

/// An established connection to the peer.
pub struct LinkChannel {
    /// Random id used to tell sessions apart in logs.
    pub session_id: Uuid,
    /// Which side of the connection this instance is.
    pub role: Role,
    /// Human-readable peer address.
    pub peer: String,
    pub receiver: Box<dyn LinkReceiver>,
    pub sender: Box<dyn LinkSender>,
}

impl LinkChannel {
    /// Wraps two halves into a channel with a fresh session id.
    pub fn new(
        role: Role,
        peer: impl Into<String>,
        receiver: Box<dyn LinkReceiver>,
        sender: Box<dyn LinkSender>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            role,
            peer: peer.into(),
            receiver,
            sender,
        }
    }
}

impl std::fmt::Debug for LinkChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkChannel")
            .field("session_id", &self.session_id)
            .field("role", &self.role)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}
