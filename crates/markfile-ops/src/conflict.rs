//! Conflict detection and resolution for file operations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use markfile_core::{is_within, normalize_path, ConflictPolicy, OpsError, Result};

use crate::prompt::{ask, OverwriteChoice, Prompter};

/// A conflict detected during a file operation.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The source path being operated on.
    pub source: PathBuf,
    /// The destination path where the conflict exists.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
}

impl Conflict {
    /// Create a new conflict.
    pub fn new(source: PathBuf, destination: PathBuf, kind: ConflictKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }

    /// Question shown to the user.
    pub fn prompt(&self) -> String {
        format!("{}: {}", self.kind, self.destination.display())
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// A file already exists at the destination.
    FileExists,
    /// A directory already exists at the destination.
    DirectoryExists,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileExists => write!(f, "File already exists"),
            Self::DirectoryExists => write!(f, "Directory already exists"),
        }
    }
}

/// What the caller should do with the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write to `destination`; `replace` is set when something is there.
    Proceed { destination: PathBuf, replace: bool },
    /// Leave source and destination untouched.
    Skip,
}

/// How an existing destination may be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceRule {
    /// Anything may be replaced (copy removes the old tree first).
    Any,
    /// A directory with entries is never replaced (move, rename).
    RefuseNonEmptyDirectory,
}

/// Runs the Overwrite / Skip / Rename protocol for one destination.
pub struct ConflictResolver<'a, P: Prompter + ?Sized> {
    prompter: &'a mut P,
    policy: ConflictPolicy,
}

impl<'a, P: Prompter + ?Sized> ConflictResolver<'a, P> {
    pub fn new(prompter: &'a mut P, policy: ConflictPolicy) -> Self {
        Self { prompter, policy }
    }

    /// Resolve `destination` for `source`.
    ///
    /// Every candidate, including names typed at the Rename prompt, must
    /// lie outside the source tree and must not contain the source.
    /// `on_conflict` is called each time an existing destination is found,
    /// before any prompt.
    pub fn resolve(
        &mut self,
        source: &Path,
        destination: PathBuf,
        rule: ReplaceRule,
        mut on_conflict: impl FnMut(&Conflict),
    ) -> Result<Resolution> {
        let mut candidate = destination;

        loop {
            check_disjoint(source, &candidate)?;

            let metadata = match fs::symlink_metadata(&candidate) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Resolution::Proceed {
                        destination: candidate,
                        replace: false,
                    });
                }
                Err(e) => return Err(OpsError::io(&candidate, e)),
            };

            if candidate == source {
                return Err(OpsError::SameFile { path: candidate });
            }

            let kind = if metadata.is_dir() {
                ConflictKind::DirectoryExists
            } else {
                ConflictKind::FileExists
            };

            if rule == ReplaceRule::RefuseNonEmptyDirectory
                && kind == ConflictKind::DirectoryExists
                && !is_empty_dir(&candidate)?
            {
                return Err(OpsError::NonEmptyDirectory { path: candidate });
            }

            let conflict = Conflict::new(source.to_path_buf(), candidate.clone(), kind);
            on_conflict(&conflict);

            let choice = match self.policy {
                ConflictPolicy::Ask => {
                    ask(&mut *self.prompter, &conflict.prompt(), OverwriteChoice::Skip)
                }
                ConflictPolicy::Overwrite => OverwriteChoice::Overwrite,
                ConflictPolicy::Skip => OverwriteChoice::Skip,
            };
            tracing::debug!(destination = %candidate.display(), ?choice, "conflict resolved");

            match choice {
                OverwriteChoice::Overwrite => {
                    return Ok(Resolution::Proceed {
                        destination: candidate,
                        replace: true,
                    });
                }
                OverwriteChoice::Skip => return Ok(Resolution::Skip),
                OverwriteChoice::Rename => {
                    let prefill = candidate.to_string_lossy().into_owned();
                    let answer = self.prompter.input("New name: ", &prefill);
                    let answer = answer.trim();
                    if answer.is_empty() {
                        return Ok(Resolution::Skip);
                    }
                    candidate = renamed_candidate(&candidate, answer)?;
                }
            }
        }
    }
}

/// Refuse a destination inside the source tree or above the source.
pub fn check_disjoint(source: &Path, destination: &Path) -> Result<()> {
    if destination == source {
        return Ok(());
    }
    if is_within(destination, source) {
        return Err(OpsError::SourceIsAncestor {
            ancestor: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    if is_within(source, destination) {
        return Err(OpsError::DestinationIsAncestor {
            path: source.to_path_buf(),
            ancestor: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Interpret a typed name relative to the conflicting destination's parent.
fn renamed_candidate(conflicting: &Path, answer: &str) -> Result<PathBuf> {
    let answer = Path::new(answer);
    if answer.is_absolute() {
        return normalize_path(answer);
    }
    let parent = conflicting.parent().unwrap_or(conflicting);
    normalize_path(parent.join(answer))
}

/// Check whether a directory has no entries.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| OpsError::io(path, e))?;
    Ok(entries.next().is_none())
}
