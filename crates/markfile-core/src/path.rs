//! Path normalization and prefix helpers.
//!
//! Every path the engine stores is absolute, has no `.` segments, no
//! repeated separators and no trailing separator (except the root itself).

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{OpsError, Result};

/// Normalize an absolute path.
///
/// Collapses repeated separators and `.` segments and drops any trailing
/// separator. `..` segments are kept as written since resolving them
/// lexically is wrong in the presence of symlinks.
pub fn normalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.is_absolute() {
        return Err(OpsError::NotAbsolute {
            path: path.to_path_buf(),
        });
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Check whether the path was written with a trailing separator.
pub fn has_trailing_separator(path: &Path) -> bool {
    let bytes = path.as_os_str().as_encoded_bytes();
    match bytes.last() {
        Some(&b) => std::path::is_separator(b as char) && bytes.len() > 1,
        None => false,
    }
}

/// Check whether `path` is `ancestor` or lies somewhere beneath it.
///
/// Matches whole components, so `/a/dir-x` is not within `/a/dir`.
pub fn is_within(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}

/// Map `path` from under `old` to the same place under `new`.
///
/// Returns `None` when `path` is not `old` or nested beneath it.
pub fn rebase(path: &Path, old: &Path, new: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(old).ok()?;
    if rest.as_os_str().is_empty() {
        Some(new.to_path_buf())
    } else {
        Some(new.join(rest))
    }
}

/// Final component of a path, or the whole path for the root.
pub fn basename(path: &Path) -> &OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}
