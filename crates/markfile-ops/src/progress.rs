//! Progress reporting types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::conflict::Conflict;
use crate::OperationError;

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Copy,
    Move,
    Delete,
    Rename,
    CreateFile,
    CreateDirectory,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
            Self::Delete => write!(f, "Delete"),
            Self::Rename => write!(f, "Rename"),
            Self::CreateFile => write!(f, "Create file"),
            Self::CreateDirectory => write!(f, "Create directory"),
        }
    }
}

/// Progress information for an ongoing batch.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items finished (succeeded, skipped or failed).
    pub items_completed: usize,
    /// Total number of items in the batch.
    pub items_total: usize,
    /// Number of bytes processed so far.
    pub bytes_processed: u64,
    /// The item currently being processed.
    pub current: Option<PathBuf>,
}

impl OperationProgress {
    /// Create a new progress tracker for a batch.
    pub fn new(operation_type: OperationType, items_total: usize) -> Self {
        Self {
            operation_type,
            items_completed: 0,
            items_total,
            bytes_processed: 0,
            current: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.items_total > 0 {
            (self.items_completed as f64 / self.items_total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Result of a completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items successfully processed.
    pub succeeded: usize,
    /// Number of items the user chose to skip.
    pub skipped: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Total bytes processed.
    pub bytes_processed: u64,
    /// Errors that occurred.
    pub errors: Vec<OperationError>,
    /// The user declined to continue after an error.
    pub aborted: bool,
}

impl OperationComplete {
    /// Check if the batch was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.aborted
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let action = match self.operation_type {
            OperationType::Copy => "Copied",
            OperationType::Move => "Moved",
            OperationType::Delete => "Deleted",
            OperationType::Rename => "Renamed",
            OperationType::CreateFile => "Created",
            OperationType::CreateDirectory => "Created",
        };

        let mut summary = format!("{} {} items", action, self.succeeded);
        if self.skipped > 0 {
            summary.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            summary.push_str(&format!(", {} failed", self.failed));
        }
        if self.aborted {
            summary.push_str(" (aborted)");
        }
        summary
    }
}

/// Event sent to async observers of a running batch.
#[derive(Debug)]
pub enum OperationResult {
    /// Progress update.
    Progress(OperationProgress),
    /// A conflict was found and is being resolved.
    Conflict(Conflict),
    /// The batch completed.
    Complete(OperationComplete),
}

/// Running counters for one batch.
#[derive(Debug)]
pub(crate) struct Tally {
    pub progress: OperationProgress,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    errors: Vec<OperationError>,
    aborted: bool,
}

impl Tally {
    pub fn new(operation_type: OperationType, items_total: usize) -> Self {
        Self {
            progress: OperationProgress::new(operation_type, items_total),
            succeeded: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
            aborted: false,
        }
    }

    pub fn start(&mut self, item: &std::path::Path) {
        self.progress.current = Some(item.to_path_buf());
    }

    pub fn succeed(&mut self, bytes: u64) {
        self.succeeded += 1;
        self.progress.bytes_processed += bytes;
        self.progress.items_completed += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
        self.progress.items_completed += 1;
    }

    pub fn fail(&mut self, error: OperationError) {
        self.failed += 1;
        self.errors.push(error);
        self.progress.items_completed += 1;
    }

    /// Count every item not yet finished as failed with one shared error.
    pub fn fail_remaining(&mut self, error: OperationError) {
        let remaining = self.remaining();
        self.failed += remaining;
        self.errors.push(error);
        self.progress.items_completed += remaining;
    }

    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Items not yet started.
    pub fn remaining(&self) -> usize {
        self.progress
            .items_total
            .saturating_sub(self.progress.items_completed)
    }

    pub fn finish(self) -> OperationComplete {
        OperationComplete {
            operation_type: self.progress.operation_type,
            succeeded: self.succeeded,
            skipped: self.skipped,
            failed: self.failed,
            bytes_processed: self.progress.bytes_processed,
            errors: self.errors,
            aborted: self.aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut tally = Tally::new(OperationType::Delete, 3);
        tally.succeed(0);
        tally.skip();
        tally.fail(OperationError::new(PathBuf::from("/x"), "boom"));
        assert_eq!(tally.remaining(), 0);

        let complete = tally.finish();
        assert!(!complete.is_success());
        assert_eq!(complete.summary(), "Deleted 1 items, 1 skipped, 1 failed");
    }

    #[test]
    fn test_percentage() {
        let mut progress = OperationProgress::new(OperationType::Copy, 4);
        progress.items_completed = 1;
        assert_eq!(progress.percentage(), 25.0);
    }
}
