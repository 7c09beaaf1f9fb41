//! ClipboardSnapshot: the last clipboard text sent to or applied from the peer.
//!
//! # Why a snapshot? (for beginners)
//!
//! Both machines poll their own clipboard.  When machine A applies a value
//! received from B, A's next poll sees a "new" clipboard value.  Without
//! remembering that this value came from B, A would send it straight back,
//! and B would do the same: an endless echo.
//!
//! The snapshot stores the last value either loop handled.  A poll that reads
//! the snapshot's value is a no-op; a received message equal to the snapshot
//! is a no-op.
//!
//! # Unset vs. empty
//!
//! The snapshot starts *unset* (`None`), which is different from holding the
//! empty string.  An empty clipboard at startup is therefore still sent once,
//! and switching from `"text"` to `""` is a real change.

/// Result of offering a value to [`ClipboardSnapshot::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The value equals the snapshot; nothing to do.
    Unchanged,
    /// The value was new and is now stored.  `previous` is what the snapshot
    /// held before, for [`ClipboardSnapshot::restore`].
    Changed { previous: Option<String> },
}

impl Observation {
    /// Returns `true` for [`Observation::Changed`].
    pub fn is_changed(&self) -> bool {
        matches!(self, Observation::Changed { .. })
    }
}

/// The last clipboard value known to both peers.
///
/// Lives for one sync session and is never persisted.  The sync engine keeps
/// it behind a mutex so that compare-and-store is a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    last: Option<String>,
}

impl ClipboardSnapshot {
    /// Creates an unset snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, or `None` if nothing has been seen yet.
    pub fn current(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Returns `true` until the first value is observed.
    pub fn is_unset(&self) -> bool {
        self.last.is_none()
    }

    /// Exact comparison: case, whitespace, and line endings all count.
    pub fn differs_from(&self, text: &str) -> bool {
        self.last.as_deref() != Some(text)
    }

    /// Stores `text` if it differs from the current value.
    pub fn observe(&mut self, text: &str) -> Observation {
        if !self.differs_from(text) {
            return Observation::Unchanged;
        }
        let previous = self.last.replace(text.to_owned());
        Observation::Changed { previous }
    }

    /// Puts back a value returned in [`Observation::Changed`].
    ///
    /// Used when applying a remote value to the local clipboard failed, so the
    /// snapshot keeps describing what the clipboard actually holds.
    pub fn restore(&mut self, previous: Option<String>) {
        self.last = previous;
    }
}
