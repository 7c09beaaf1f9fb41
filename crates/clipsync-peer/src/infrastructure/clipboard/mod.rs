//! Clipboard adapters implementing [`ClipboardPort`].
//!
//! - **`system`** – The real OS clipboard through `arboard` (X11/Wayland on
//!   Linux, `NSPasteboard` on macOS, the Win32 clipboard on Windows).
//! - **`memory`** – An in-process clipboard for tests and headless runs.

pub mod memory;
pub mod system;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::clipboard::ClipboardPort;

pub use memory::MemoryClipboard;
pub use system::SystemClipboard;

/// Which clipboard adapter to run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardBackend {
    /// The OS clipboard.
    #[default]
    System,
    /// A private in-memory clipboard.
    Memory,
}

impl fmt::Display for ClipboardBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardBackend::System => f.write_str("system"),
            ClipboardBackend::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for ClipboardBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(ClipboardBackend::System),
            "memory" => Ok(ClipboardBackend::Memory),
            other => Err(format!(
                "unknown clipboard backend '{other}' (expected system or memory)"
            )),
        }
    }
}

/// Creates the adapter for `backend`.
pub fn create_clipboard(backend: ClipboardBackend) -> Arc<dyn ClipboardPort> {
    match backend {
        ClipboardBackend::System => Arc::new(SystemClipboard::new()),
        ClipboardBackend::Memory => Arc::new(MemoryClipboard::new()),
    }
}
