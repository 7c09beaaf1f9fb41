//! Command-line interface.
//!
//! Flags override values from the `--config` file, which override the
//! built-in defaults.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use clipsync_core::WireFormat;

use crate::infrastructure::clipboard::ClipboardBackend;
use crate::infrastructure::storage::config::{load_config, ConfigError, PeerConfig};

/// Mirror the text clipboard between two machines over TCP.
#[derive(Debug, Clone, Parser)]
#[command(name = "clipsync", version, about)]
pub struct Cli {
    /// IP address of this machine; the listening socket binds to it.
    pub local_ip: IpAddr,

    /// IP address of the other machine.
    pub remote_ip: IpAddr,

    /// Port used on both sides [default: 65432].
    #[arg(long)]
    pub port: Option<u16>,

    /// Port to listen on, when it differs from the remote port.
    #[arg(long)]
    pub local_port: Option<u16>,

    /// Port to dial, when it differs from the local port.
    #[arg(long)]
    pub remote_port: Option<u16>,

    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Wire format: framed or raw. Both peers must agree.
    #[arg(long, value_name = "FORMAT")]
    pub wire_format: Option<WireFormat>,

    /// Clipboard polling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Bound on one dial attempt in milliseconds.
    #[arg(long, value_name = "MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Give up listening after this many seconds; 0 waits forever.
    #[arg(long, value_name = "SECS")]
    pub accept_timeout_secs: Option<u64>,

    /// Exit when the link drops instead of negotiating again.
    #[arg(long)]
    pub no_reconnect: bool,

    /// Clipboard backend: system or memory.
    #[arg(long, value_name = "BACKEND")]
    pub clipboard: Option<ClipboardBackend>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Writes every flag that was given into `cfg`.
    pub fn apply_overrides(&self, cfg: &mut PeerConfig) {
        if let Some(port) = self.port {
            cfg.network.port = port;
            cfg.network.local_port = None;
            cfg.network.remote_port = None;
        }
        if let Some(port) = self.local_port {
            cfg.network.local_port = Some(port);
        }
        if let Some(port) = self.remote_port {
            cfg.network.remote_port = Some(port);
        }
        if let Some(format) = self.wire_format {
            cfg.network.wire_format = format;
        }
        if let Some(ms) = self.poll_interval_ms {
            cfg.sync.poll_interval_ms = ms;
        }
        if let Some(ms) = self.connect_timeout_ms {
            cfg.network.connect_timeout_ms = ms;
        }
        if let Some(secs) = self.accept_timeout_secs {
            cfg.network.accept_timeout_secs = secs;
        }
        if self.no_reconnect {
            cfg.reconnect.enabled = false;
        }
        if let Some(backend) = self.clipboard {
            cfg.sync.clipboard = backend;
        }
        if let Some(level) = &self.log_level {
            cfg.logging.log_level = level.clone();
        }
    }

    /// Loads the config file (if any), applies the flags and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded or the merged
    /// configuration is invalid.
    pub fn resolve_config(&self) -> Result<PeerConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => PeerConfig::default(),
        };
        self.apply_overrides(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }
}
