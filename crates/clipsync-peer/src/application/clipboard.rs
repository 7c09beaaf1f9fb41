//! ClipboardPort: the application's view of the local OS clipboard.
//!
//! The sync engine only ever reads and writes plain text.  Platform adapters
//! live in the infrastructure layer; see `infrastructure::clipboard`.

use std::sync::Arc;

use thiserror::Error;

/// Error type for clipboard access.
///
/// Both variants are treated as transient by the sync engine: the failed poll
/// or write is logged and the next cycle tries again.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard could be opened (headless session, another process holds it).
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    /// The platform API reported an error.
    #[error("clipboard platform error: {0}")]
    Platform(String),
}

/// Platform-agnostic text clipboard.
///
/// Implementations are blocking; the engine calls them on Tokio's blocking
/// thread pool.
#[cfg_attr(test, mockall::automock)]
pub trait ClipboardPort: Send + Sync {
    /// Returns the current clipboard text.  An empty clipboard reads as `""`.
    fn read_text(&self) -> Result<String, ClipboardError>;

    /// Replaces the clipboard contents with `text`.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Runs [`ClipboardPort::read_text`] on the blocking pool.
pub(crate) async fn read_clipboard(
    port: &Arc<dyn ClipboardPort>,
) -> Result<String, ClipboardError> {
    let port = Arc::clone(port);
    tokio::task::spawn_blocking(move || port.read_text())
        .await
        .map_err(|e| ClipboardError::Platform(format!("clipboard read task failed: {e}")))?
}

/// Runs [`ClipboardPort::write_text`] on the blocking pool.
pub(crate) async fn write_clipboard(
    port: &Arc<dyn ClipboardPort>,
    text: String,
) -> Result<(), ClipboardError> {
    let port = Arc::clone(port);
    tokio::task::spawn_blocking(move || port.write_text(&text))
        .await
        .map_err(|e| ClipboardError::Platform(format!("clipboard write task failed: {e}")))?
}
