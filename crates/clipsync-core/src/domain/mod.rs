//! Domain entities for clipsync.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from OS APIs, network libraries, or clipboards.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! For clipsync the domain is small: which side of the link we are
//! ([`role::Role`]) and what we last saw on the clipboard
//! ([`snapshot::ClipboardSnapshot`]).  The snapshot is what stops a value
//! received from the peer from being sent straight back to it.

/// Which end of the link this instance is.
pub mod role;

/// Last-seen clipboard content used for change detection and echo suppression.
pub mod snapshot;
