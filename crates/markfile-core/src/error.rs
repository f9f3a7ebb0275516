//! Error types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while operating on marked paths.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be read (usually a vanished path).
    #[error("Metadata unavailable: {path}")]
    MetadataUnavailable { path: PathBuf },

    /// A path that must be absolute was not.
    #[error("Not an absolute path: {path}")]
    NotAbsolute { path: PathBuf },

    /// Refused to replace a directory that still has entries.
    #[error("Directory is not empty: {path}")]
    NonEmptyDirectory { path: PathBuf },

    /// Source and destination are the same path.
    #[error("Source and destination are the same: {path}")]
    SameFile { path: PathBuf },

    /// Cannot copy or move a directory into itself.
    #[error("Cannot copy/move {ancestor} into itself ({destination})")]
    SourceIsAncestor {
        ancestor: PathBuf,
        destination: PathBuf,
    },

    /// Cannot replace a directory that contains the source.
    #[error("Cannot replace {ancestor}: it contains {path}")]
    DestinationIsAncestor { path: PathBuf, ancestor: PathBuf },

    /// The requested file name is not usable.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The path to be created already exists.
    #[error("Already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The edited list no longer lines up with its snapshot.
    #[error("Line count changed: expected {expected}, found {found}")]
    LineCountMismatch { expected: usize, found: usize },

    /// The user declined (Skip, No, or empty input).
    #[error("Cancelled")]
    Cancelled,
}

/// Broad category of an [`OpsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// stat/scandir/open/rename/unlink/mkdir failures.
    Io,
    /// Refused by the engine's own rules.
    Structural,
    /// A normal terminal outcome chosen by the user.
    Cancelled,
}

impl OpsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied { .. }
            | Self::NotFound { .. }
            | Self::Io { .. }
            | Self::MetadataUnavailable { .. } => ErrorCategory::Io,
            Self::Cancelled => ErrorCategory::Cancelled,
            _ => ErrorCategory::Structural,
        }
    }

    /// Check if this is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The path this error is about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::MetadataUnavailable { path }
            | Self::NotAbsolute { path }
            | Self::NonEmptyDirectory { path }
            | Self::SameFile { path }
            | Self::AlreadyExists { path }
            | Self::DestinationIsAncestor { path, .. } => Some(path),
            Self::SourceIsAncestor { ancestor, .. } => Some(ancestor),
            Self::InvalidName { .. } | Self::LineCountMismatch { .. } | Self::Cancelled => None,
        }
    }
}

/// Convenience alias used across the workspace.
pub type Result<T, E = OpsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ops_error_io() {
        let err = OpsError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, OpsError::PermissionDenied { .. }));
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_ops_error_io_keeps_os_message() {
        let err = OpsError::io("/x", std::io::Error::other("disk on fire"));
        assert!(err.to_string().contains("disk on fire"));
        assert!(err.to_string().contains("/x"));
    }

    #[test]
    fn test_categories() {
        let err = OpsError::NonEmptyDirectory {
            path: PathBuf::from("/a"),
        };
        assert_eq!(err.category(), ErrorCategory::Structural);
        assert!(OpsError::Cancelled.is_cancelled());
        let err = OpsError::DestinationIsAncestor {
            path: PathBuf::from("/a/a"),
            ancestor: PathBuf::from("/a"),
        };
        assert_eq!(err.category(), ErrorCategory::Structural);
        assert_eq!(err.path(), Some(std::path::Path::new("/a/a")));
        assert_eq!(OpsError::Cancelled.category(), ErrorCategory::Cancelled);
    }
}
