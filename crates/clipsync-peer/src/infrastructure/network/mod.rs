//! Network infrastructure for the peer.
//!
//! - **`link`** – [`link::StreamReceiver`] and [`link::StreamSender`], the
//!   framed and raw wire formats over any async byte stream, plus
//!   [`link::tcp_link`] to wrap an established `TcpStream`.
//!
//! - **`negotiator`** – [`negotiator::TcpNegotiator`], which dials the remote
//!   peer and falls back to listening when the dial fails.

pub mod link;
pub mod negotiator;

pub use link::{stream_link, tcp_link, LinkLimits, StreamReceiver, StreamSender};
pub use negotiator::{NegotiationConfig, TcpNegotiator};
