//! Storage infrastructure: the optional TOML configuration file.

pub mod config;
