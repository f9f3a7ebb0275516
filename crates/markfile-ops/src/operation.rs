//! File operation types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use markfile_core::{OpsError, Result};

use crate::clipboard::{Clipboard, SortOrder};

/// A file operation to be executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileOperation {
    /// Copy files/directories to a destination.
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Move files/directories to a destination.
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Rename a single file or directory to a new absolute path.
    Rename { source: PathBuf, destination: PathBuf },
    /// Rename several paths, in the given order.
    RenameBatch { renames: Vec<PendingRename> },
    /// Delete files/directories.
    Delete { targets: Vec<PathBuf> },
    /// Create a new empty file.
    CreateFile { path: PathBuf },
    /// Create a new directory.
    CreateDirectory { path: PathBuf },
}

impl FileOperation {
    /// Create a copy operation.
    pub fn copy(sources: Vec<PathBuf>, destination: PathBuf) -> Self {
        Self::Copy {
            sources,
            destination,
        }
    }

    /// Copy everything on the clipboard.
    pub fn copy_clipboard(clipboard: &Clipboard, destination: PathBuf) -> Self {
        Self::copy(clipboard.entries(SortOrder::Descending), destination)
    }

    /// Create a move operation.
    pub fn move_to(sources: Vec<PathBuf>, destination: PathBuf) -> Self {
        Self::Move {
            sources,
            destination,
        }
    }

    /// Move everything on the clipboard.
    pub fn move_clipboard(clipboard: &Clipboard, destination: PathBuf) -> Self {
        Self::move_to(clipboard.entries(SortOrder::Descending), destination)
    }

    /// Create a rename operation.
    pub fn rename(source: PathBuf, destination: PathBuf) -> Self {
        Self::Rename {
            source,
            destination,
        }
    }

    /// Create a delete operation.
    pub fn delete(targets: Vec<PathBuf>) -> Self {
        Self::Delete { targets }
    }

    /// Delete everything on the clipboard.
    pub fn delete_clipboard(clipboard: &Clipboard) -> Self {
        Self::delete(clipboard.entries(SortOrder::Descending))
    }

    /// Create a file creation operation.
    pub fn create_file(path: PathBuf) -> Self {
        Self::CreateFile { path }
    }

    /// Create a directory creation operation.
    pub fn create_directory(path: PathBuf) -> Self {
        Self::CreateDirectory { path }
    }
}

/// One line of a bulk rename: the original path and where it should go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRename {
    pub original: PathBuf,
    pub proposed: PathBuf,
}

impl PendingRename {
    pub fn new(original: impl Into<PathBuf>, proposed: impl Into<PathBuf>) -> Self {
        Self {
            original: original.into(),
            proposed: proposed.into(),
        }
    }

    /// Check if the rename actually changes anything.
    pub fn is_change(&self) -> bool {
        self.original != self.proposed
    }
}

/// Pair two equal-length lists by position.
///
/// Any inserted or deleted line breaks the correspondence, so differing
/// lengths are refused outright.
pub fn pair_positionally(originals: &[PathBuf], proposed: &[PathBuf]) -> Result<Vec<PendingRename>> {
    if originals.len() != proposed.len() {
        return Err(OpsError::LineCountMismatch {
            expected: originals.len(),
            found: proposed.len(),
        });
    }

    Ok(originals
        .iter()
        .zip(proposed)
        .map(|(original, proposed)| PendingRename::new(original.clone(), proposed.clone()))
        .collect())
}

/// An error that occurred during a file operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Record an engine error against the item it happened on.
    pub fn from_ops(item: &std::path::Path, error: &OpsError) -> Self {
        Self::new(
            error.path().unwrap_or(item).to_path_buf(),
            error.to_string(),
        )
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_positionally() {
        let originals = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let proposed = vec![PathBuf::from("/a"), PathBuf::from("/c")];

        let pairs = pair_positionally(&originals, &proposed).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(!pairs[0].is_change());
        assert!(pairs[1].is_change());
    }

    #[test]
    fn test_pair_positionally_rejects_length_change() {
        let originals = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let proposed = vec![PathBuf::from("/a")];

        let err = pair_positionally(&originals, &proposed).unwrap_err();
        assert!(matches!(
            err,
            OpsError::LineCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }
}
