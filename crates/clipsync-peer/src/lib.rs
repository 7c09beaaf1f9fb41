//! clipsync-peer library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does a peer do? (for beginners)
//!
//! Two machines each run one peer, pointed at each other:
//!
//! ```text
//! host A$ clipsync 10.0.0.1 10.0.0.2
//! host B$ clipsync 10.0.0.2 10.0.0.1
//! ```
//!
//! 1. The peers agree on who dials and who listens and end up with one TCP
//!    connection between them (`infrastructure::network::negotiator`).
//! 2. Each peer polls its own clipboard and sends every new value to the
//!    other (`application::sync_engine`, outbound loop).
//! 3. Each peer writes values received from the other into its clipboard,
//!    remembering them so they are not sent straight back (inbound loop).
//! 4. If the connection drops, both peers negotiate again
//!    (`application::supervisor`).

/// Application layer: traits and use cases.
pub mod application;

/// Command-line parsing and config overrides.
pub mod cli;

/// Infrastructure layer: TCP, clipboard adapters and config file.
pub mod infrastructure;
