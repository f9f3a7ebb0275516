//! File and directory creation.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use markfile_core::{normalize_path, OpsError, Result};

use crate::executor::BatchExecutor;
use crate::materialize::ensure_parent_dirs;
use crate::prompt::Prompter;
use crate::rename::validate_filename;

impl<P: Prompter> BatchExecutor<P> {
    /// Create a new empty file, along with any missing parent directories.
    pub fn create_file(&mut self, path: &Path) -> Result<PathBuf> {
        let path = prepare(path)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| creation_error(&path, e))?;

        tracing::debug!(path = %path.display(), "created file");
        self.notifier().refresh();
        Ok(path)
    }

    /// Create a new directory, along with any missing parent directories.
    pub fn create_directory(&mut self, path: &Path) -> Result<PathBuf> {
        let path = prepare(path)?;
        fs::create_dir(&path).map_err(|e| creation_error(&path, e))?;

        tracing::debug!(path = %path.display(), "created directory");
        self.notifier().refresh();
        Ok(path)
    }
}

fn prepare(path: &Path) -> Result<PathBuf> {
    let path = normalize_path(path)?;

    if let Some(name) = path.file_name() {
        validate_filename(&name.to_string_lossy())?;
    }

    if fs::symlink_metadata(&path).is_ok() {
        return Err(OpsError::AlreadyExists { path });
    }

    ensure_parent_dirs(&path)?;
    Ok(path)
}

fn creation_error(path: &Path, error: io::Error) -> OpsError {
    if error.kind() == io::ErrorKind::AlreadyExists {
        OpsError::AlreadyExists {
            path: path.to_path_buf(),
        }
    } else {
        OpsError::io(path, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use crate::notify::OpenHandles;
    use crate::prompt::ScriptedPrompter;
    use std::sync::Arc;

    #[test]
    fn test_create_file_with_parents() {
        let temp = tempfile::tempdir().unwrap();
        let handles = Arc::new(OpenHandles::new());
        let mut executor =
            BatchExecutor::new(Clipboard::new(handles.clone()), ScriptedPrompter::new());

        let path = temp.path().join("a/b/new.txt");
        let created = executor.create_file(&path).unwrap();

        assert_eq!(created, path);
        assert!(path.is_file());
        assert_eq!(handles.refresh_count(), 1);
    }

    #[test]
    fn test_create_directory() {
        let temp = tempfile::tempdir().unwrap();
        let mut executor = BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new());

        let path = temp.path().join("fresh");
        executor.create_directory(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_create_existing_fails() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("taken.txt");
        fs::write(&path, "x").unwrap();

        let mut executor = BatchExecutor::new(Clipboard::default(), ScriptedPrompter::new());
        let err = executor.create_file(&path).unwrap_err();
        assert!(matches!(err, OpsError::AlreadyExists { .. }));

        let err = executor.create_directory(&path).unwrap_err();
        assert!(matches!(err, OpsError::AlreadyExists { .. }));
    }
}
