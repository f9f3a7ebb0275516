//! Rename operation.

use std::fs;
use std::path::{Path, PathBuf};

use markfile_core::{normalize_path, OpsError, Result};

use crate::conflict::{ReplaceRule, Resolution};
use crate::executor::{clear_for_rename, BatchExecutor};
use crate::materialize::ensure_parent_dirs;
use crate::operation::PendingRename;
use crate::progress::{OperationComplete, OperationType, Tally};
use crate::prompt::Prompter;

/// What a single rename ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Old and new path are the same; nothing was touched.
    Unchanged,
    /// The item now lives at this path.
    Renamed(PathBuf),
    /// The user skipped the conflicting destination.
    Skipped,
}

impl<P: Prompter> BatchExecutor<P> {
    /// Rename `source` to the absolute path `destination`.
    ///
    /// Missing parent directories of the new path are created. Replacing a
    /// directory that still has entries is refused for every conflict
    /// answer.
    pub fn rename(&mut self, source: &Path, destination: &Path) -> Result<RenameOutcome> {
        let source = normalize_path(source)?;
        let destination = normalize_path(destination)?;
        if source == destination {
            return Ok(RenameOutcome::Unchanged);
        }

        let metadata = fs::symlink_metadata(&source).map_err(|e| OpsError::io(&source, e))?;

        let Resolution::Proceed {
            destination,
            replace,
        } = self.resolve_conflict(&source, destination, ReplaceRule::RefuseNonEmptyDirectory)?
        else {
            return Ok(RenameOutcome::Skipped);
        };

        ensure_parent_dirs(&destination)?;
        if replace {
            clear_for_rename(&metadata, &destination)?;
        }
        self.rename_path(&source, &destination)?;
        self.notifier().refresh();

        Ok(RenameOutcome::Renamed(destination))
    }

    /// Give `source` a new name in the same directory.
    pub fn rename_in_place(&mut self, source: &Path, new_name: &str) -> Result<RenameOutcome> {
        validate_filename(new_name)?;
        let source = normalize_path(source)?;
        let parent = source.parent().unwrap_or(source.as_path());
        let destination = parent.join(new_name);
        self.rename(&source, &destination)
    }

    /// Apply several renames in order.
    ///
    /// Unchanged and skipped pairs count as skipped. After a failure the
    /// user is asked whether to continue (default from
    /// `rename_continue_default`).
    pub fn rename_batch(&mut self, renames: &[PendingRename]) -> OperationComplete {
        let mut tally = Tally::new(OperationType::Rename, renames.len());

        for pending in renames {
            self.begin(&mut tally, &pending.original);
            match self.rename(&pending.original, &pending.proposed) {
                Ok(RenameOutcome::Renamed(_)) => tally.succeed(0),
                Ok(RenameOutcome::Unchanged | RenameOutcome::Skipped) => tally.skip(),
                Err(e) => {
                    let go_on = self.config.rename_continue_default;
                    if !self.item_failed(&mut tally, &pending.original, e, go_on) {
                        break;
                    }
                }
            }
        }

        self.finish(tally)
    }
}

/// Validate a single path component for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(OpsError::invalid_name(name, "Name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(OpsError::invalid_name(
            name,
            "Name is too long (max 255 bytes)",
        ));
    }

    if let Some(c) = ['/', '\0'].into_iter().find(|c| name.contains(*c)) {
        return Err(OpsError::invalid_name(
            name,
            format!("Name cannot contain {c:?}"),
        ));
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        if let Some(c) = windows_invalid.into_iter().find(|c| name.contains(*c)) {
            return Err(OpsError::invalid_name(
                name,
                format!("Name cannot contain {c:?}"),
            ));
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper = name.to_uppercase();
        let stem = upper.split('.').next().unwrap_or("");
        if reserved.contains(&stem) {
            return Err(OpsError::invalid_name(name, "Reserved filename"));
        }
    }

    if name == "." || name == ".." {
        return Err(OpsError::invalid_name(name, "'.' and '..' are reserved"));
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(OpsError::invalid_name(
            name,
            "Name cannot start or end with spaces",
        ));
    }

    if name.ends_with('.') {
        return Err(OpsError::invalid_name(name, "Name cannot end with a dot"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use crate::prompt::ScriptedPrompter;

    #[test]
    fn test_validate_filename_valid() {
        assert!(validate_filename("test.txt").is_ok());
        assert!(validate_filename("my-file").is_ok());
        assert!(validate_filename(".hidden").is_ok());
        assert!(validate_filename("file with spaces").is_ok());
    }

    #[test]
    fn test_validate_filename_invalid() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename("test/file").is_err());
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("file ").is_err());
        assert!(validate_filename(" file").is_err());
        assert!(validate_filename("file.").is_err());
        assert!(validate_filename(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_rename_creates_missing_parents() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, "x").unwrap();
        let destination = temp.path().join("new/deeper/b.txt");

        let mut executor = BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new());
        let outcome = executor.rename(&source, &destination).unwrap();

        assert_eq!(outcome, RenameOutcome::Renamed(destination.clone()));
        assert!(destination.exists());
        assert!(!source.exists());
    }

    #[test]
    fn test_rename_to_same_path_is_unchanged() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, "x").unwrap();

        let mut executor = BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new());
        let outcome = executor.rename(&source, &source).unwrap();

        assert_eq!(outcome, RenameOutcome::Unchanged);
        assert!(executor.prompter().prompts.is_empty());
    }

    #[test]
    fn test_rename_in_place() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, "x").unwrap();

        let mut clipboard = Clipboard::default();
        clipboard.add(&source);
        let mut executor = BatchExecutor::new(clipboard, ScriptedPrompter::new());

        executor.rename_in_place(&source, "b.txt").unwrap();

        assert!(temp.path().join("b.txt").exists());
        assert!(executor.clipboard().contains(temp.path().join("b.txt")));
        assert!(executor.rename_in_place(&temp.path().join("b.txt"), "x/y").is_err());
    }

    #[test]
    fn test_rename_overwrite_replaces_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.txt");
        let destination = temp.path().join("b.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old").unwrap();

        let mut executor =
            BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new().choose("Overwrite"));
        executor.rename(&source, &destination).unwrap();

        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
        assert!(!source.exists());
    }

    #[test]
    fn test_rename_batch_stops_by_default_after_failure() {
        let temp = tempfile::tempdir().unwrap();
        let present = temp.path().join("present.txt");
        fs::write(&present, "x").unwrap();

        let renames = [
            PendingRename::new(temp.path().join("gone.txt"), temp.path().join("g2.txt")),
            PendingRename::new(present.clone(), temp.path().join("p2.txt")),
        ];

        let mut executor = BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new());
        let complete = executor.rename_batch(&renames);

        assert_eq!(complete.failed, 1);
        assert!(complete.aborted);
        assert!(present.exists());
    }
}
