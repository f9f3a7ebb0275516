//! Editable path lists: clipboard review and bulk rename.
//!
//! Opening a surface captures the current list as an immutable snapshot
//! and hands back the text to edit. Whatever triggers the commit (closing
//! an editor, losing focus) calls [`SnapshotEditor::commit`] with the final
//! text; the editor diffs it against the snapshot and turns it into
//! clipboard changes or renames. Surfaces are single-use.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use markfile_core::{normalize_path, OpsConfig, Result};

use crate::clipboard::{Clipboard, SortOrder};
use crate::executor::BatchExecutor;
use crate::operation::{pair_positionally, PendingRename};
use crate::progress::OperationComplete;
use crate::prompt::{ask, CommitChoice, Prompter, YesNo};

/// Opaque handle of an open editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// What a surface edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// The clipboard, one marked path per line.
    ClipboardReview,
    /// A list of paths to rename in place, line for line.
    Rename,
}

/// Text handed to the host when a surface opens.
#[derive(Debug, Clone)]
pub struct EditSurface {
    pub id: SurfaceId,
    pub mode: EditMode,
    /// Comment header followed by one path per line.
    pub lines: Vec<String>,
}

impl EditSurface {
    /// The lines joined into editable text.
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Result of committing a surface.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The edited list matched the snapshot; nothing was done.
    Unchanged,
    /// The user said no at the confirmation.
    Declined,
    /// The clipboard now holds exactly `entries` paths.
    ClipboardReplaced { entries: usize },
    /// Renames were run; here is how they went.
    Renamed(OperationComplete),
    /// The surface had already been committed or discarded.
    Closed,
}

#[derive(Debug)]
struct PendingEdit {
    mode: EditMode,
    snapshot: Vec<PathBuf>,
}

/// Registry of open editing surfaces.
#[derive(Debug)]
pub struct SnapshotEditor {
    sessions: HashMap<SurfaceId, PendingEdit>,
    next_id: u64,
    config: OpsConfig,
}

impl Default for SnapshotEditor {
    fn default() -> Self {
        Self::new(&OpsConfig::default())
    }
}

impl SnapshotEditor {
    pub fn new(config: &OpsConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 0,
            config: config.clone(),
        }
    }

    /// Open the clipboard for review, in ascending order.
    pub fn open_clipboard_review(&mut self, clipboard: &Clipboard) -> EditSurface {
        let snapshot = clipboard.entries(SortOrder::Ascending);
        let header = [
            "Marked paths, one per line.".to_string(),
            "Delete a line to unmark it, add a line to mark a path.".to_string(),
        ];
        self.open(EditMode::ClipboardReview, snapshot, &header)
    }

    /// Open `paths` for bulk rename, keeping their order.
    ///
    /// Paths that are not absolute are left out.
    pub fn open_rename(&mut self, paths: &[PathBuf]) -> EditSurface {
        let snapshot: Vec<PathBuf> = paths
            .iter()
            .filter_map(|path| match normalize_path(path) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "left out of rename list");
                    None
                }
            })
            .collect();
        let header = [
            "Edit each path to rename it.".to_string(),
            "Keep one line per path: lines are matched by position.".to_string(),
        ];
        self.open(EditMode::Rename, snapshot, &header)
    }

    fn open(&mut self, mode: EditMode, snapshot: Vec<PathBuf>, header: &[String]) -> EditSurface {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;

        let lines = header
            .iter()
            .map(|line| format!("{} {line}", self.config.comment_marker))
            .chain(snapshot.iter().map(|path| path.display().to_string()))
            .collect();

        tracing::debug!(%id, ?mode, entries = snapshot.len(), "opened edit surface");
        self.sessions.insert(id, PendingEdit { mode, snapshot });
        EditSurface { id, mode, lines }
    }

    /// Check whether a surface still awaits its commit.
    pub fn is_open(&self, id: SurfaceId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of surfaces awaiting a commit.
    pub fn open_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop a surface without acting on it.
    pub fn discard(&mut self, id: SurfaceId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Apply the final text of a surface.
    ///
    /// The surface is closed as soon as this is called, whatever the
    /// outcome; committing it again returns [`CommitOutcome::Closed`].
    pub fn commit<P: Prompter>(
        &mut self,
        id: SurfaceId,
        text: &str,
        executor: &mut BatchExecutor<P>,
    ) -> Result<CommitOutcome> {
        let Some(pending) = self.sessions.remove(&id) else {
            tracing::debug!(%id, "commit on closed surface ignored");
            return Ok(CommitOutcome::Closed);
        };

        let lines = self.read_lines(text);
        match pending.mode {
            EditMode::ClipboardReview => commit_review(&pending.snapshot, &lines, executor),
            EditMode::Rename => commit_rename(&pending.snapshot, &lines, executor),
        }
    }

    /// Non-blank, non-comment lines, trimmed, without trailing separators.
    fn read_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.config.is_comment(line))
            .map(strip_trailing_separators)
            .collect()
    }
}

fn strip_trailing_separators(line: &str) -> String {
    let stripped = line.trim_end_matches(std::path::is_separator);
    if stripped.is_empty() {
        line[..1].to_string()
    } else {
        stripped.to_string()
    }
}

fn commit_review<P: Prompter>(
    snapshot: &[PathBuf],
    lines: &[String],
    executor: &mut BatchExecutor<P>,
) -> Result<CommitOutcome> {
    let surviving: Vec<PathBuf> = lines
        .iter()
        .filter_map(|line| match normalize_path(line) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "dropping clipboard line");
                None
            }
        })
        .filter(|path| fs::symlink_metadata(path).is_ok())
        .collect();

    if surviving == snapshot {
        return Ok(CommitOutcome::Unchanged);
    }

    let answer = ask(
        executor.prompter_mut(),
        &format!("Replace clipboard with {} path(s)?", surviving.len()),
        YesNo::Yes,
    );
    if !answer.is_yes() {
        return Ok(CommitOutcome::Declined);
    }

    let clipboard = executor.clipboard_mut();
    clipboard.replace_all(&surviving);
    Ok(CommitOutcome::ClipboardReplaced {
        entries: clipboard.len(),
    })
}

fn commit_rename<P: Prompter>(
    snapshot: &[PathBuf],
    lines: &[String],
    executor: &mut BatchExecutor<P>,
) -> Result<CommitOutcome> {
    let proposed: Vec<PathBuf> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| resolve_rename_line(snapshot.get(index), line))
        .collect();

    if proposed == snapshot {
        return Ok(CommitOutcome::Unchanged);
    }

    let changed: Vec<PendingRename> = pair_positionally(snapshot, &proposed)?
        .into_iter()
        .filter(PendingRename::is_change)
        .collect();

    let prompter = executor.prompter_mut();
    let prompt = format!("Rename {} item(s)?", changed.len());
    let confirmed = match ask(prompter, &prompt, CommitChoice::No) {
        CommitChoice::Yes => true,
        CommitChoice::No => false,
        CommitChoice::Diff => {
            for rename in &changed {
                prompter.report(&format!(
                    "{} --> {}",
                    rename.original.display(),
                    rename.proposed.display()
                ));
            }
            ask(prompter, &prompt, YesNo::No).is_yes()
        }
    };

    if !confirmed {
        return Ok(CommitOutcome::Declined);
    }
    Ok(CommitOutcome::Renamed(executor.rename_batch(&changed)))
}

/// A relative line names a path next to the original on the same line.
fn resolve_rename_line(original: Option<&PathBuf>, line: &str) -> PathBuf {
    let path = Path::new(line);
    let joined = match original.and_then(|original| original.parent()) {
        Some(parent) if path.is_relative() => parent.join(path),
        _ => path.to_path_buf(),
    };
    normalize_path(&joined).unwrap_or(joined)
}
