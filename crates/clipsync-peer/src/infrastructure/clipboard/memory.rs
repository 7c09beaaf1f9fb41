//! In-memory clipboard.
//!
//! Used by the integration tests to stand in for two machines' clipboards
//! inside one process, and selectable with `--clipboard memory` for
//! headless runs.

use std::sync::{Mutex, MutexGuard};

use crate::application::clipboard::{ClipboardError, ClipboardPort};

#[derive(Debug, Default)]
struct State {
    text: String,
    writes: Vec<String>,
    fail_reads: bool,
    fail_writes: bool,
}

/// A clipboard that lives in process memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<State>,
}

impl MemoryClipboard {
    /// An empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that already holds `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set(text);
        clipboard
    }

    /// Simulates a local copy by the user; not recorded as a write.
    pub fn set(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    /// Current contents.
    pub fn get(&self) -> String {
        self.lock().text.clone()
    }

    /// Every value written through [`ClipboardPort::write_text`], in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClipboardPort for MemoryClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(ClipboardError::Unavailable("memory clipboard read disabled".to_string()));
        }
        Ok(state.text.clone())
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(ClipboardError::Platform("memory clipboard write disabled".to_string()));
        }
        state.text = text.to_string();
        state.writes.push(text.to_string());
        Ok(())
    }
}
