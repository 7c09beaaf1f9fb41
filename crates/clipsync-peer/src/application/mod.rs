//! Application layer use cases for the clipsync peer.
//!
//! # What lives here?
//!
//! - **`clipboard`** – The [`clipboard::ClipboardPort`] trait: read and write
//!   clipboard text.  OS adapters implement it in the infrastructure layer.
//!
//! - **`link`** – The [`link::LinkChannel`] the sync engine talks through,
//!   split into a sending and a receiving half.
//!
//! - **`negotiation`** – The [`negotiation::Negotiator`] trait that produces a
//!   link, and the errors negotiation can end with.
//!
//! - **`sync_engine`** – The outbound and inbound loops that mirror the
//!   clipboard over one link.
//!
//! - **`supervisor`** – Runs negotiation and the sync engine in a loop,
//!   renegotiating with backoff when the link drops.
//!
//! **Dependency rule**: nothing in this layer imports `infrastructure`.

pub mod clipboard;
pub mod link;
pub mod negotiation;
pub mod supervisor;
pub mod sync_engine;
