//! # clipsync-core
//!
//! Shared library for clipsync containing the wire framing codec, protocol
//! constants, and the domain types of clipboard synchronization.
//!
//! It has zero dependencies on OS APIs, clipboards, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! clipsync mirrors one text clipboard between exactly two computers over a
//! direct TCP connection.  There is no server: both machines run the same
//! program, and the two instances work out between themselves which one dials
//! and which one listens.  Once connected, each side polls its own clipboard
//! and sends changes to the other, and applies whatever the other side sends.
//!
//! This crate (`clipsync-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How clipboard text travels over the wire.  The default
//!   framed format prefixes every value with a 5-byte header (version +
//!   length); the legacy raw format writes bare UTF-8 bytes.
//!
//! - **`domain`** – Pure logic with no I/O.  The important piece is the
//!   [`ClipboardSnapshot`]: the last value seen on either side, used to
//!   suppress echo loops.

pub mod domain;
pub mod protocol;

pub use domain::role::Role;
pub use domain::snapshot::{ClipboardSnapshot, Observation};
pub use protocol::codec::{decode_frame, decode_frame_header, encode_frame, ProtocolError};
pub use protocol::messages::WireFormat;
