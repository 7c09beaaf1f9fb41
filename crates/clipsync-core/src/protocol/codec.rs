//! Binary codec for the framed clipsync wire format.
//!
//! Wire format:
//! ```text
//! [version:1][payload_len:4][payload:N]
//! ```
//! Header size: 5 bytes.  `payload_len` is big-endian.  The payload is the
//! clipboard text encoded as UTF-8.  A zero-length payload is a real value
//! (the empty clipboard), not a keep-alive.
//!
//! The raw legacy format has no codec: a value is its UTF-8 bytes.  Only
//! [`decode_text`] applies to both formats.

use thiserror::Error;

use crate::protocol::messages::{FRAME_HEADER_SIZE, PROTOCOL_VERSION};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The version byte of a frame header is not one this build speaks.
    ///
    /// Usually means the peer is running with the raw wire format.
    #[error("unsupported protocol version: 0x{0:02X}")]
    UnsupportedVersion(u8),

    /// A frame declares (or a caller tries to send) more bytes than allowed.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes one clipboard value into a complete frame (header + payload).
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the UTF-8 encoding of `text`
/// is longer than `max_len` or does not fit a `u32` length field.
///
/// # Examples
///
/// ```rust
/// use clipsync_core::protocol::codec::{decode_frame, encode_frame};
///
/// let bytes = encode_frame("hello", 1024).unwrap();
/// assert_eq!(bytes.len(), 5 + 5);
/// let (text, consumed) = decode_frame(&bytes, 1024).unwrap();
/// assert_eq!(text, "hello");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_frame(text: &str, max_len: usize) -> Result<Vec<u8>, ProtocolError> {
    let payload = text.as_bytes();
    if payload.len() > max_len || payload.len() > u32::MAX as usize {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: max_len.min(u32::MAX as usize),
        });
    }

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.push(PROTOCOL_VERSION);
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Validates a frame header and returns the declared payload length.
///
/// Callers reading from a stream use this after reading exactly
/// [`FRAME_HEADER_SIZE`] bytes, then read the returned number of bytes.
///
/// # Errors
///
/// Returns [`ProtocolError`] for short input, a wrong version byte, or a
/// declared length above `max_len`.
pub fn decode_frame_header(header: &[u8], max_len: usize) -> Result<usize, ProtocolError> {
    if header.len() < FRAME_HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: FRAME_HEADER_SIZE,
            available: header.len(),
        });
    }

    let version = header[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if payload_len > max_len {
        return Err(ProtocolError::FrameTooLarge {
            len: payload_len,
            max: max_len,
        });
    }
    Ok(payload_len)
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the text and the total number of bytes consumed (header +
/// payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the header is invalid, the payload is
/// incomplete, or the payload is not UTF-8.
pub fn decode_frame(bytes: &[u8], max_len: usize) -> Result<(String, usize), ProtocolError> {
    let payload_len = decode_frame_header(bytes, max_len)?;

    let total_needed = FRAME_HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    let text = decode_text(bytes[FRAME_HEADER_SIZE..total_needed].to_vec())?;
    Ok((text, total_needed))
}

/// Converts received payload bytes into clipboard text.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUtf8`] if the bytes are not valid UTF-8.
/// In the raw format this also happens when a multi-byte character was split
/// across two reads.
pub fn decode_text(payload: Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(payload).map_err(|e| ProtocolError::InvalidUtf8(e.utf8_error().to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
