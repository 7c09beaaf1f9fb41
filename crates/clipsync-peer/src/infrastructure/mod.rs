//! Infrastructure layer for the clipsync peer.
//!
//! Contains the OS-facing adapters behind the application layer's traits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `clipsync_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`clipboard`** – `ClipboardPort` implementations: the system clipboard
//!   via `arboard`, and an in-memory clipboard.
//!
//! - **`network`** – TCP role negotiation (dial, then listen) and the framed
//!   and raw link formats over a connected stream.
//!
//! - **`storage`** – The optional TOML configuration file.

pub mod clipboard;
pub mod network;
pub mod storage;
