//! Recursive copy and delete of file trees.
//!
//! Both walks are depth-first. A directory that cannot be read stops the
//! walk immediately; nothing is retried and nothing already written or
//! removed is rolled back.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use markfile_core::{OpsError, Result};

/// Copy a file or a whole directory tree to `destination`.
///
/// A single child file that fails to copy does not stop the walk; the
/// first such failure is returned after the rest of the tree is done.
/// Returns the number of bytes copied.
pub fn copy_tree(source: &Path, destination: &Path, preserve_permissions: bool) -> Result<u64> {
    let metadata = fs::symlink_metadata(source).map_err(|e| OpsError::io(source, e))?;

    if metadata.is_dir() {
        let mut first_failure = None;
        let bytes = copy_dir(source, destination, preserve_permissions, &mut first_failure)?;
        match first_failure {
            Some(e) => Err(e),
            None => Ok(bytes),
        }
    } else if metadata.file_type().is_symlink() {
        copy_symlink(source, destination)?;
        Ok(0)
    } else {
        copy_file(source, destination)
    }
}

fn copy_dir(
    source: &Path,
    destination: &Path,
    preserve_permissions: bool,
    first_failure: &mut Option<OpsError>,
) -> Result<u64> {
    match fs::create_dir(destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && destination.is_dir() => {}
        Err(e) => return Err(OpsError::io(destination, e)),
    }

    let mut total_bytes = 0u64;
    let entries = fs::read_dir(source).map_err(|e| OpsError::io(source, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| OpsError::io(source, e))?;
        let path = entry.path();
        let dest_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| OpsError::io(&path, e))?;

        if file_type.is_dir() {
            total_bytes += copy_dir(&path, &dest_path, preserve_permissions, first_failure)?;
            continue;
        }

        let copied = if file_type.is_symlink() {
            copy_symlink(&path, &dest_path).map(|()| 0)
        } else {
            copy_file(&path, &dest_path)
        };

        match copied {
            Ok(bytes) => total_bytes += bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to copy entry, continuing");
                first_failure.get_or_insert(e);
            }
        }
    }

    // Applied last so a read-only source still lets us fill the copy.
    if preserve_permissions {
        let permissions = fs::metadata(source)
            .map_err(|e| OpsError::io(source, e))?
            .permissions();
        fs::set_permissions(destination, permissions).map_err(|e| OpsError::io(destination, e))?;
    }

    tracing::debug!(from = %source.display(), to = %destination.display(), "copied directory");
    Ok(total_bytes)
}

fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let bytes = fs::copy(source, destination).map_err(|e| OpsError::io(source, e))?;
    tracing::debug!(from = %source.display(), to = %destination.display(), bytes, "copied file");
    Ok(bytes)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> Result<()> {
    let target = fs::read_link(source).map_err(|e| OpsError::io(source, e))?;
    std::os::unix::fs::symlink(&target, destination).map_err(|e| OpsError::io(destination, e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> Result<()> {
    copy_file(source, destination).map(|_| ())
}

/// Delete a file, symlink, or a whole directory tree.
pub fn delete_tree(path: &Path) -> Result<()> {
    delete_tree_with(path, |_| {})
}

/// Like [`delete_tree`], calling `on_removed` after each entry is gone.
///
/// Entries are removed children first, so `on_removed` sees a directory
/// only after everything inside it.
pub fn delete_tree_with(path: &Path, mut on_removed: impl FnMut(&Path)) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| OpsError::io(path, e))?;

    if !metadata.is_dir() {
        fs::remove_file(path).map_err(|e| OpsError::io(path, e))?;
        on_removed(path);
        return Ok(());
    }

    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())
        } else {
            fs::remove_file(entry.path())
        };
        removed.map_err(|e| OpsError::io(entry.path(), e))?;
        tracing::debug!(path = %entry.path().display(), "removed");
        on_removed(entry.path());
    }

    Ok(())
}

fn walk_error(root: &Path, error: walkdir::Error) -> OpsError {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match error.into_io_error() {
        Some(e) => OpsError::io(path, e),
        None => OpsError::Io {
            path,
            source: io::Error::other("filesystem loop detected"),
        },
    }
}
