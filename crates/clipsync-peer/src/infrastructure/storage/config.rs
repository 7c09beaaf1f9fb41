//! TOML configuration for one clipsync peer.
//!
//! The file is optional and given with `--config PATH`.  Every field has a
//! default, so a file only needs the settings it changes:
//!
//! ```toml
//! [network]
//! port = 65432
//! connect_timeout_ms = 3000
//! accept_timeout_secs = 0        # 0 = wait forever
//! wire_format = "framed"         # or "raw"
//!
//! [sync]
//! poll_interval_ms = 500
//! max_message_bytes = 16777216
//! raw_read_buffer = 4096
//! clipboard = "system"           # or "memory"
//!
//! [reconnect]
//! enabled = true
//! initial_backoff_ms = 1000
//! max_backoff_ms = 30000
//! rejoin_accept_timeout_ms = 5000
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! # Serde default values
//!
//! `#[serde(default = "some_fn")]` fills a missing field with `some_fn()`,
//! and `#[serde(default)]` on a section fills a missing section from its
//! `Default` impl.  Command-line flags are applied on top afterwards (see
//! `crate::cli`).

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clipsync_core::protocol::messages::{
    DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_PORT, DEFAULT_POLL_INTERVAL, RAW_READ_BUFFER_SIZE,
};
use clipsync_core::WireFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::supervisor::SupervisorConfig;
use crate::infrastructure::clipboard::ClipboardBackend;
use crate::infrastructure::network::negotiator::DEFAULT_CONNECT_TIMEOUT;
use crate::infrastructure::network::{LinkLimits, NegotiationConfig};

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level peer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeerConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ports, timeouts and wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Port used on both sides unless overridden below.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Port this instance listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    /// Port this instance dials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,
    /// Bound on one dial attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bound on the first listening phase; `0` waits forever.
    #[serde(default)]
    pub accept_timeout_secs: u64,
    #[serde(default)]
    pub wire_format: WireFormat,
}

/// Sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Largest framed message accepted or sent.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Bytes per read in the raw wire format.
    #[serde(default = "default_raw_read_buffer")]
    pub raw_read_buffer: usize,
    #[serde(default)]
    pub clipboard: ClipboardBackend,
}

/// Renegotiation after a lost link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Base listening time when renegotiating, before jitter.
    #[serde(default = "default_rejoin_accept_timeout_ms")]
    pub rejoin_accept_timeout_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}
fn default_raw_read_buffer() -> usize {
    RAW_READ_BUFFER_SIZE
}
fn default_true() -> bool {
    true
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_rejoin_accept_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            local_port: None,
            remote_port: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            accept_timeout_secs: 0,
            wire_format: WireFormat::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_message_bytes: default_max_message_bytes(),
            raw_read_buffer: default_raw_read_buffer(),
            clipboard: ClipboardBackend::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rejoin_accept_timeout_ms: default_rejoin_accept_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Derived runtime settings ──────────────────────────────────────────────────

impl PeerConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the peer cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("sync.poll_interval_ms must be greater than 0".into()));
        }
        if self.sync.max_message_bytes == 0 {
            return Err(ConfigError::Invalid(
                "sync.max_message_bytes must be greater than 0".into(),
            ));
        }
        if self.sync.max_message_bytes > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "sync.max_message_bytes must not exceed {}",
                u32::MAX
            )));
        }
        if self.sync.raw_read_buffer == 0 {
            return Err(ConfigError::Invalid("sync.raw_read_buffer must be greater than 0".into()));
        }
        if self.reconnect.initial_backoff_ms > self.reconnect.max_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "reconnect.initial_backoff_ms ({}) exceeds reconnect.max_backoff_ms ({})",
                self.reconnect.initial_backoff_ms, self.reconnect.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Port this instance listens on.
    pub fn local_port(&self) -> u16 {
        self.network.local_port.unwrap_or(self.network.port)
    }

    /// Port this instance dials.
    pub fn remote_port(&self) -> u16 {
        self.network.remote_port.unwrap_or(self.network.port)
    }

    pub fn link_limits(&self) -> LinkLimits {
        LinkLimits {
            max_message_bytes: self.sync.max_message_bytes,
            raw_read_buffer: self.sync.raw_read_buffer,
        }
    }

    /// Negotiation settings for the given pair of addresses.
    pub fn negotiation_config(&self, local_ip: IpAddr, remote_ip: IpAddr) -> NegotiationConfig {
        NegotiationConfig {
            local_addr: SocketAddr::new(local_ip, self.local_port()),
            remote_addr: SocketAddr::new(remote_ip, self.remote_port()),
            connect_timeout: Duration::from_millis(self.network.connect_timeout_ms),
            wire_format: self.network.wire_format,
            limits: self.link_limits(),
        }
    }

    /// Session supervisor settings.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        let accept_timeout = match self.network.accept_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        SupervisorConfig {
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            accept_timeout,
            reconnect: self.reconnect.enabled,
            initial_backoff: Duration::from_millis(self.reconnect.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.reconnect.max_backoff_ms),
            rejoin_accept_timeout: Duration::from_millis(self.reconnect.rejoin_accept_timeout_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the config file at `path`.
///
/// The result is not validated: command-line flags may still replace bad
/// values, so callers run [`PeerConfig::validate`] after merging.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (a missing file is
/// an error: the path was given explicitly) and [`ConfigError::Parse`] for
/// malformed TOML.
pub fn load_config(path: &Path) -> Result<PeerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    PeerConfig::from_toml_str(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
