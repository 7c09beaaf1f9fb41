//! Stream-backed implementation of the link channel.
//!
//! Any `AsyncRead`/`AsyncWrite` pair can carry a link; in production it is
//! the two halves of a `TcpStream`, in tests an in-memory duplex pipe.
//!
//! # Reading a framed message
//!
//! The framed header carries the payload length at bytes 1..5, so the
//! receiver first reads exactly 5 header bytes, then exactly `payload_len`
//! more.  A clean end of stream before the first header byte means the peer
//! closed the connection.
//!
//! # Reading a raw message
//!
//! One `read` call of at most `raw_read_buffer` bytes is one message,
//! whatever arrived.  A zero-length read means the peer closed the
//! connection.

use async_trait::async_trait;
use clipsync_core::protocol::codec::{decode_frame_header, decode_text, encode_frame};
use clipsync_core::protocol::messages::{
    DEFAULT_MAX_MESSAGE_BYTES, FRAME_HEADER_SIZE, RAW_READ_BUFFER_SIZE,
};
use clipsync_core::{Role, WireFormat};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::application::link::{Delivery, LinkChannel, LinkError, LinkReceiver, LinkSender};

/// Size limits applied to one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLimits {
    /// Largest framed payload accepted or sent.
    pub max_message_bytes: usize,
    /// Bytes requested per read in the raw format.
    pub raw_read_buffer: usize,
}

impl Default for LinkLimits {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            raw_read_buffer: RAW_READ_BUFFER_SIZE,
        }
    }
}

/// Receiving half over any `AsyncRead`.
pub struct StreamReceiver<R> {
    reader: R,
    format: WireFormat,
    max_message_bytes: usize,
    raw_buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> StreamReceiver<R> {
    /// Creates a receiver for `format`.
    pub fn new(reader: R, format: WireFormat, limits: LinkLimits) -> Self {
        Self {
            reader,
            format,
            max_message_bytes: limits.max_message_bytes,
            raw_buf: vec![0u8; limits.raw_read_buffer.max(1)],
        }
    }

    async fn receive_framed(&mut self) -> Result<String, LinkError> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        if let Err(e) = self.reader.read_exact(&mut header).await {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(LinkError::Closed);
            }
            return Err(e.into());
        }

        let payload_len = decode_frame_header(&header, self.max_message_bytes)?;
        let mut payload = vec![0u8; payload_len];
        self.reader.read_exact(&mut payload).await?;
        Ok(decode_text(payload)?)
    }

    async fn receive_raw(&mut self) -> Result<String, LinkError> {
        let n = self.reader.read(&mut self.raw_buf).await?;
        if n == 0 {
            return Err(LinkError::Closed);
        }
        if n == self.raw_buf.len() {
            debug!("raw read filled the {n} byte buffer; value may be truncated");
        }
        Ok(decode_text(self.raw_buf[..n].to_vec())?)
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LinkReceiver for StreamReceiver<R> {
    async fn receive(&mut self) -> Result<String, LinkError> {
        match self.format {
            WireFormat::Framed => self.receive_framed().await,
            WireFormat::Raw => self.receive_raw().await,
        }
    }
}

/// Sending half over any `AsyncWrite`.
///
/// The writer is held in an `Option` so that [`LinkSender::close`] can take
/// it out exactly once.
pub struct StreamSender<W> {
    writer: Option<W>,
    format: WireFormat,
    max_message_bytes: usize,
}

impl<W: AsyncWrite + Unpin + Send> StreamSender<W> {
    /// Creates a sender for `format`.
    pub fn new(writer: W, format: WireFormat, limits: LinkLimits) -> Self {
        Self {
            writer: Some(writer),
            format,
            max_message_bytes: limits.max_message_bytes,
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> LinkSender for StreamSender<W> {
    async fn send(&mut self, text: &str) -> Result<Delivery, LinkError> {
        let writer = self.writer.as_mut().ok_or(LinkError::Closed)?;
        match self.format {
            WireFormat::Framed => {
                let frame = encode_frame(text, self.max_message_bytes)?;
                writer.write_all(&frame).await?;
            }
            WireFormat::Raw => {
                if text.is_empty() {
                    return Ok(Delivery::Skipped);
                }
                writer.write_all(text.as_bytes()).await?;
            }
        }
        writer.flush().await?;
        Ok(Delivery::Written)
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("shutdown of link writer failed: {e}");
            }
        }
    }
}

/// Builds a [`LinkChannel`] from a reader/writer pair.
pub fn stream_link<R, W>(
    role: Role,
    peer: impl Into<String>,
    reader: R,
    writer: W,
    format: WireFormat,
    limits: LinkLimits,
) -> LinkChannel
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    LinkChannel::new(
        role,
        peer,
        Box::new(StreamReceiver::new(reader, format, limits)),
        Box::new(StreamSender::new(writer, format, limits)),
    )
}

/// Builds a [`LinkChannel`] over an established TCP connection.
pub fn tcp_link(
    stream: TcpStream,
    role: Role,
    format: WireFormat,
    limits: LinkLimits,
) -> LinkChannel {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("could not disable Nagle's algorithm: {e}");
    }
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let (read_half, write_half) = stream.into_split();
    stream_link(role, peer, read_half, write_half, format, limits)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clipsync_core::ProtocolError;
    use tokio::io::duplex;
    use tokio_test::io::Builder;

    fn small_limits() -> LinkLimits {
        LinkLimits {
            max_message_bytes: 64,
            raw_read_buffer: 8,
        }
    }

    // ── Framed ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_framed_receiver_reassembles_header_and_payload_split_across_reads() {
        // Arrange: the frame for "hello" arrives in three pieces.
        let reader = Builder::new()
            .read(&[0x02, 0, 0])
            .read(&[0, 5, b'h', b'e'])
            .read(b"llo")
            .build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Framed, LinkLimits::default());

        // Act
        let text = rx.receive().await.expect("receive");

        // Assert
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_framed_receiver_returns_empty_string_for_zero_length_frame() {
        let reader = Builder::new().read(&[0x02, 0, 0, 0, 0]).build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Framed, LinkLimits::default());

        assert_eq!(rx.receive().await.expect("receive"), "");
    }

    #[tokio::test]
    async fn test_framed_receiver_reports_clean_eof_as_closed() {
        let reader = Builder::new().build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Framed, LinkLimits::default());

        assert!(matches!(rx.receive().await, Err(LinkError::Closed)));
    }

    #[tokio::test]
    async fn test_framed_receiver_rejects_raw_peer() {
        // A raw-format peer sends bare text; the first byte is not a version.
        let reader = Builder::new().read(b"hello").build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Framed, LinkLimits::default());

        let result = rx.receive().await;

        assert!(matches!(
            result,
            Err(LinkError::Protocol(ProtocolError::UnsupportedVersion(b'h')))
        ));
    }

    #[tokio::test]
    async fn test_framed_receiver_rejects_oversized_frame_before_reading_payload() {
        let reader = Builder::new().read(&[0x02, 0, 0, 1, 0]).build(); // 256 > 64
        let mut rx = StreamReceiver::new(reader, WireFormat::Framed, small_limits());

        let result = rx.receive().await;

        assert!(matches!(
            result,
            Err(LinkError::Protocol(ProtocolError::FrameTooLarge { len: 256, max: 64 }))
        ));
    }

    #[tokio::test]
    async fn test_framed_sender_writes_one_frame_per_value() {
        let writer = Builder::new()
            .write(&[0x02, 0, 0, 0, 2, b'h', b'i'])
            .write(&[0x02, 0, 0, 0, 0])
            .build();
        let mut tx = StreamSender::new(writer, WireFormat::Framed, LinkLimits::default());

        tx.send("hi").await.expect("send");
        tx.send("").await.expect("send empty");
    }

    #[tokio::test]
    async fn test_framed_sender_refuses_value_above_limit() {
        let writer = Builder::new().build();
        let mut tx = StreamSender::new(writer, WireFormat::Framed, small_limits());

        let result = tx.send(&"z".repeat(65)).await;

        assert!(matches!(
            result,
            Err(LinkError::Protocol(ProtocolError::FrameTooLarge { .. }))
        ));
    }

    // ── Raw ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_raw_receiver_treats_each_read_as_one_message() {
        let reader = Builder::new().read(b"first").read(b"second").build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Raw, LinkLimits::default());

        assert_eq!(rx.receive().await.expect("first"), "first");
        assert_eq!(rx.receive().await.expect("second"), "second");
        assert!(matches!(rx.receive().await, Err(LinkError::Closed)));
    }

    #[tokio::test]
    async fn test_raw_receiver_splits_value_longer_than_buffer() {
        // Documented limitation of the raw format: 8-byte buffer, 12-byte value.
        let reader = Builder::new().read(b"abcdefghijkl").build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Raw, small_limits());

        assert_eq!(rx.receive().await.expect("first part"), "abcdefgh");
        assert_eq!(rx.receive().await.expect("second part"), "ijkl");
    }

    #[tokio::test]
    async fn test_raw_receiver_reports_split_utf8_as_recoverable() {
        // "€" is E2 82 AC; a read boundary after two bytes breaks it.
        let reader = Builder::new().read(&[0xE2, 0x82]).build();
        let mut rx = StreamReceiver::new(reader, WireFormat::Raw, LinkLimits::default());

        let err = rx.receive().await.expect_err("must not decode");

        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_raw_sender_writes_bare_bytes_and_skips_empty_value() {
        let writer = Builder::new().write(b"plain text").build();
        let mut tx = StreamSender::new(writer, WireFormat::Raw, LinkLimits::default());

        let empty = tx.send("").await.expect("empty is a no-op");
        let text = tx.send("plain text").await.expect("send");

        assert_eq!(empty, Delivery::Skipped);
        assert_eq!(text, Delivery::Written);
    }

    // ── Close ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_further_sends() {
        // Arrange
        let (a, _b) = duplex(64);
        let mut tx = StreamSender::new(a, WireFormat::Framed, LinkLimits::default());

        // Act
        tx.close().await;
        tx.close().await;
        let result = tx.send("late").await;

        // Assert
        assert!(tx.writer.is_none());
        assert!(matches!(result, Err(LinkError::Closed)));
    }

    #[tokio::test]
    async fn test_close_is_seen_as_peer_closed_on_the_other_end() {
        let (a, b) = duplex(64);
        let mut tx = StreamSender::new(a, WireFormat::Framed, LinkLimits::default());
        let mut rx = StreamReceiver::new(b, WireFormat::Framed, LinkLimits::default());

        tx.send("last").await.expect("send");
        tx.close().await;

        assert_eq!(rx.receive().await.expect("receive"), "last");
        assert!(matches!(rx.receive().await, Err(LinkError::Closed)));
    }

    // ── stream_link ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_stream_link_carries_values_both_ways() {
        // Arrange: two links wired back to back.
        let (left, right) = duplex(1024);
        let (left_r, left_w) = tokio::io::split(left);
        let (right_r, right_w) = tokio::io::split(right);
        let limits = LinkLimits::default();
        let mut x = stream_link(Role::Listener, "y", left_r, left_w, WireFormat::Framed, limits);
        let mut y = stream_link(Role::Dialer, "x", right_r, right_w, WireFormat::Framed, limits);

        // Act
        x.sender.send("hello").await.expect("x send");
        y.sender.send("world").await.expect("y send");

        // Assert
        assert_eq!(y.receiver.receive().await.expect("y receive"), "hello");
        assert_eq!(x.receiver.receive().await.expect("x receive"), "world");
        assert_ne!(x.session_id, y.session_id);
    }

    // ── With the sync engine ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_oversized_local_value_does_not_end_framed_session() {
        use crate::application::sync_engine::{SessionOutcome, SyncEngine};
        use crate::infrastructure::clipboard::MemoryClipboard;
        use std::sync::Arc;
        use std::time::Duration;
        use tokio_util::sync::CancellationToken;

        // Arrange: a 100-byte clipboard over a link limited to 64 bytes,
        // one fresh engine per session as the supervisor does.
        let clipboard = Arc::new(MemoryClipboard::with_text("x".repeat(100)));

        for _ in 0..3 {
            let engine = SyncEngine::new(clipboard.clone(), Duration::from_millis(10));
            let (local, _remote) = duplex(1024);
            let (r, w) = tokio::io::split(local);
            let link = stream_link(Role::Dialer, "peer", r, w, WireFormat::Framed, small_limits());
            let cancel = CancellationToken::new();
            let stopper = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(60)).await;
                    cancel.cancel();
                })
            };

            // Act
            let outcome = engine.run(link, &cancel).await;
            stopper.await.unwrap();

            // Assert
            assert!(matches!(outcome, SessionOutcome::Cancelled), "{outcome:?}");
            assert_eq!(engine.stats().sent(), 0);
        }
    }
}
