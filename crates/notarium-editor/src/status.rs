//! Save-status indicator seam.

use tracing::{info, warn};

/// Lifecycle of one save attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// A save request is in flight.
    Saving,
    /// The last save succeeded.
    Saved,
    /// The last save failed; local edits are retained.
    Failed(String),
}

/// Receives save-status transitions from the reconciliation loop.
///
/// Implementations must be non-blocking: the controller calls this inline
/// from the save path.
pub trait StatusSink: Send + Sync {
    fn status(&self, status: SaveStatus);
}

/// Default sink: forwards transitions to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn status(&self, status: SaveStatus) {
        match status {
            SaveStatus::Saving => info!(component = "editor", "Saving note"),
            SaveStatus::Saved => info!(component = "editor", "Note saved"),
            SaveStatus::Failed(reason) => {
                warn!(component = "editor", error = %reason, "Save failed, edits retained")
            }
        }
    }
}
