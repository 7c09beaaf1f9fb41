//! OS clipboard through `arboard`.
//!
//! Opening the clipboard can fail transiently (no display yet, another
//! process holding it on Windows), so the handle is opened lazily on first
//! use and dropped after any error; the next call reopens it.

use std::sync::Mutex;

use tracing::debug;

use crate::application::clipboard::{ClipboardError, ClipboardPort};

/// The real system clipboard.
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    /// Creates an adapter; the OS clipboard is opened on first access.
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    fn with_handle<T>(
        &self,
        op: impl FnOnce(&mut arboard::Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, ClipboardError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| ClipboardError::Platform("clipboard handle lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            debug!("opened system clipboard");
            *guard = Some(clipboard);
        }

        let Some(clipboard) = guard.as_mut() else {
            return Err(ClipboardError::Unavailable("clipboard not open".to_string()));
        };
        let result = op(clipboard);
        if result.is_err() {
            *guard = None;
        }
        result.map_err(map_arboard_error)
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardPort for SystemClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        self.with_handle(|cb| match cb.get_text() {
            // Empty clipboard, or one holding only non-text content.
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            other => other,
        })
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.with_handle(|cb| cb.set_text(text.to_owned()))
    }
}

fn map_arboard_error(err: arboard::Error) -> ClipboardError {
    match err {
        arboard::Error::ContentNotAvailable
        | arboard::Error::ClipboardNotSupported
        | arboard::Error::ClipboardOccupied => {
            ClipboardError::Unavailable(err.to_string())
        }
        other => ClipboardError::Platform(other.to_string()),
    }
}
