//! Progress reporting types for batch operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::operation::{OperationError, OperationKind};

/// Progress of a running batch.
///
/// `completed` counts items processed so far, successful or not, and never
/// decreases within one batch. A `total` of 0 means the count is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The type of operation.
    pub kind: OperationKind,
    /// Human-readable phase label.
    pub label: String,
    /// Number of items processed.
    pub completed: usize,
    /// Total number of items.
    pub total: usize,
    /// The item currently being processed.
    pub current: Option<PathBuf>,
    /// Bytes written or removed so far.
    pub bytes_processed: u64,
}

impl ProgressEvent {
    /// Create a progress tracker for an operation.
    pub fn new(kind: OperationKind, total: usize) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            completed: 0,
            total,
            current: None,
            bytes_processed: 0,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.completed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Whether the total is unknown.
    pub fn is_indeterminate(&self) -> bool {
        self.total == 0
    }

    /// Update the item being processed.
    pub fn set_current(&mut self, path: Option<PathBuf>) {
        self.current = path;
    }

    /// Count one more processed item and add its bytes.
    pub fn complete_item(&mut self, bytes: u64) {
        self.completed += 1;
        self.bytes_processed = self.bytes_processed.saturating_add(bytes);
    }
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every item was attempted; some may have failed.
    Completed,
    /// The cancellation token fired; later items were never started.
    Cancelled,
    /// The batch was aborted as a whole.
    Failed { reason: String },
}

/// Terminal result of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// The type of operation.
    pub kind: OperationKind,
    pub status: OutcomeStatus,
    /// Number of items successfully processed.
    pub succeeded: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Total bytes processed.
    pub bytes_processed: u64,
    /// Per-item failures, in the order they happened.
    pub errors: Vec<OperationError>,
}

impl Outcome {
    /// An outcome for a batch that was aborted before any item succeeded.
    pub fn fatal(kind: OperationKind, items: usize, reason: impl Into<String>) -> Self {
        Self {
            kind,
            status: OutcomeStatus::Failed {
                reason: reason.into(),
            },
            succeeded: 0,
            failed: items.max(1),
            bytes_processed: 0,
            errors: Vec::new(),
        }
    }

    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Completed && self.failed == 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OutcomeStatus::Cancelled
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let action = self.kind.past_tense();
        match &self.status {
            OutcomeStatus::Failed { reason } => format!("{} failed: {}", self.kind, reason),
            OutcomeStatus::Cancelled => format!(
                "{} cancelled: {} {} items, {} failed",
                self.kind, action, self.succeeded, self.failed
            ),
            OutcomeStatus::Completed if self.failed == 0 => {
                format!("{} {} items", action, self.succeeded)
            }
            OutcomeStatus::Completed => {
                format!("{} {} items, {} failed", action, self.succeeded, self.failed)
            }
        }
    }
}

/// One message on a batch's event channel.
///
/// Every batch ends with exactly one `Complete`, after which the channel
/// closes.
#[derive(Debug, Clone)]
pub enum OperationEvent {
    Progress(ProgressEvent),
    Complete(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: OutcomeStatus, succeeded: usize, failed: usize) -> Outcome {
        Outcome {
            kind: OperationKind::Copy,
            status,
            succeeded,
            failed,
            bytes_processed: 0,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_percentage() {
        let mut progress = ProgressEvent::new(OperationKind::Delete, 4);
        assert_eq!(progress.percentage(), 0.0);
        progress.complete_item(10);
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(progress.bytes_processed, 10);
        assert_eq!(progress.label, "Deleting files...");
    }

    #[test]
    fn test_indeterminate() {
        let progress = ProgressEvent::new(OperationKind::Compress, 0);
        assert!(progress.is_indeterminate());
        assert_eq!(progress.percentage(), 0.0);
    }

    #[test]
    fn test_summaries() {
        assert_eq!(
            outcome(OutcomeStatus::Completed, 3, 0).summary(),
            "Copied 3 items"
        );
        assert_eq!(
            outcome(OutcomeStatus::Completed, 1, 1).summary(),
            "Copied 1 items, 1 failed"
        );
        assert_eq!(
            outcome(OutcomeStatus::Cancelled, 2, 0).summary(),
            "Copy cancelled: Copied 2 items, 0 failed"
        );
        assert_eq!(
            Outcome::fatal(OperationKind::Extract, 1, "Wrong password").summary(),
            "Extract failed: Wrong password"
        );
    }

    #[test]
    fn test_success_requires_completion_without_failures() {
        assert!(outcome(OutcomeStatus::Completed, 2, 0).is_success());
        assert!(!outcome(OutcomeStatus::Completed, 1, 1).is_success());
        assert!(!outcome(OutcomeStatus::Cancelled, 2, 0).is_success());

        let fatal = Outcome::fatal(OperationKind::Copy, 3, "no destination");
        assert!(!fatal.is_success());
        assert_eq!(fatal.succeeded, 0);
        assert_eq!(fatal.failed, 3);
    }
}
