//! Protocol module containing wire constants and the frame codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, decode_frame_header, decode_text, encode_frame, ProtocolError};
pub use messages::*;
