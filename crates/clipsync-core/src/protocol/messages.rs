//! Protocol constants and wire format selection.
//!
//! Two wire formats exist:
//!
//! - **Framed** (protocol version 2, the default): every clipboard value is
//!   sent as `[version:1][payload_len:4][payload:N]`.  The receiver always
//!   knows exactly how many bytes belong to one value.
//! - **Raw** (legacy): every value is a single write of its bare UTF-8 bytes.
//!   The receiver reads up to [`RAW_READ_BUFFER_SIZE`] bytes per call and
//!   treats whatever arrived as one value.  Large values may be truncated or
//!   merged; this format exists only to talk to peers that speak it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Version byte at the start of every framed message.
pub const PROTOCOL_VERSION: u8 = 0x02;

/// Size of the framed header: version (1) + payload length (4).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Largest payload accepted in the framed format unless configured otherwise.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Bytes requested per read call in the raw format.
pub const RAW_READ_BUFFER_SIZE: usize = 4096;

/// TCP port used by both peers unless overridden.
pub const DEFAULT_PORT: u16 = 65432;

/// Interval between two reads of the local clipboard.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ── Wire format ───────────────────────────────────────────────────────────────

/// Selects how clipboard values are delimited on the TCP stream.
///
/// Both peers must use the same format; there is no negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Length-prefixed frames (protocol version 2).
    #[default]
    Framed,
    /// Unframed UTF-8 bytes, one write per value.
    Raw,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Framed => f.write_str("framed"),
            WireFormat::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "framed" => Ok(WireFormat::Framed),
            "raw" => Ok(WireFormat::Raw),
            other => Err(format!("unknown wire format '{other}' (expected 'framed' or 'raw')")),
        }
    }
}
