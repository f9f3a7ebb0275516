//! Creation of missing ancestor directories.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use markfile_core::{OpsError, Result};

/// What [`ensure_parent_dirs`] found and created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPathInfo {
    /// Longest leading part of the parent directory that already existed.
    pub existing_prefix: PathBuf,
    /// The part that had to be created, relative to `existing_prefix`.
    pub created_suffix: Option<PathBuf>,
}

impl CreatedPathInfo {
    fn unchanged(prefix: PathBuf) -> Self {
        Self {
            existing_prefix: prefix,
            created_suffix: None,
        }
    }

    /// Check if any directory was created.
    pub fn created_anything(&self) -> bool {
        self.created_suffix.is_some()
    }

    /// The full parent directory, `existing_prefix` joined with the suffix.
    pub fn full_path(&self) -> PathBuf {
        match &self.created_suffix {
            Some(suffix) => self.existing_prefix.join(suffix),
            None => self.existing_prefix.clone(),
        }
    }
}

/// Create every missing directory between the root and `target`'s parent.
///
/// Walks left to right after the root marker; the final segment of
/// `target` is never created. A relative `target` is a precondition
/// violation: it is logged and nothing happens.
pub fn ensure_parent_dirs(target: &Path) -> Result<CreatedPathInfo> {
    let parent = target.parent().unwrap_or(target);

    if !target.is_absolute() {
        tracing::warn!(path = %target.display(), "ensure_parent_dirs called with a relative path");
        return Ok(CreatedPathInfo::unchanged(parent.to_path_buf()));
    }

    let mut current = PathBuf::new();
    let mut existing_prefix = PathBuf::new();
    let mut created = PathBuf::new();

    for component in parent.components() {
        current.push(component.as_os_str());

        if matches!(component, Component::Prefix(_) | Component::RootDir) {
            existing_prefix.push(component.as_os_str());
            continue;
        }

        if created.as_os_str().is_empty() && current.exists() {
            existing_prefix.push(component.as_os_str());
            continue;
        }

        match fs::create_dir(&current) {
            Ok(()) => {}
            // Lost a race with another creator; the directory is there.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && current.is_dir() => {}
            Err(e) => return Err(OpsError::io(&current, e)),
        }
        tracing::debug!(path = %current.display(), "created directory");
        created.push(component.as_os_str());
    }

    Ok(CreatedPathInfo {
        existing_prefix,
        created_suffix: (!created.as_os_str().is_empty()).then_some(created),
    })
}
