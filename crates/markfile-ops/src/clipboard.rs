//! The clipboard: the set of marked paths awaiting a batch action.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use markfile_core::{is_within, normalize_path, rebase};

use crate::notify::{Notifier, NullNotifier};

/// Iteration order over clipboard entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Lexicographic by path string.
    #[default]
    Ascending,
    /// Reverse lexicographic: nested paths before their ancestors.
    Descending,
}

/// Marked paths, unique and ordered by their raw path string.
///
/// Every mutation that changes the set sends a refresh signal to the
/// notifier the clipboard was built with.
pub struct Clipboard {
    entries: BTreeSet<OsString>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipboard")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(Arc::new(NullNotifier))
    }
}

impl Clipboard {
    /// Create an empty clipboard reporting to `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            entries: BTreeSet::new(),
            notifier,
        }
    }

    /// The notifier shared with the executor.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Mark a path. Returns `true` if it was not already marked.
    pub fn add(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(key) = key_for(path.as_ref()) else {
            return false;
        };
        let changed = self.entries.insert(key);
        self.changed(changed)
    }

    /// Unmark a path. Returns `true` if it was marked.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(key) = key_for(path.as_ref()) else {
            return false;
        };
        let changed = self.entries.remove(&key);
        self.changed(changed)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        key_for(path.as_ref()).is_some_and(|key| self.entries.contains(&key))
    }

    /// Flip the marked state of a path. Returns the new state.
    pub fn toggle(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.contains(path) {
            self.remove(path);
            false
        } else {
            self.add(path)
        }
    }

    /// Unmark everything.
    pub fn clear(&mut self) {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        self.changed(changed);
    }

    /// Mark several paths with a single refresh.
    pub fn extend<I, T>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        let before = self.entries.len();
        self.entries
            .extend(paths.into_iter().filter_map(|path| key_for(path.as_ref())));
        let added = self.entries.len() - before;
        self.changed(added > 0);
        added
    }

    /// Replace the whole content with `paths`.
    pub fn replace_all<I, T>(&mut self, paths: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<Path>,
    {
        let entries: BTreeSet<OsString> = paths
            .into_iter()
            .filter_map(|path| key_for(path.as_ref()))
            .collect();
        let changed = entries != self.entries;
        self.entries = entries;
        self.changed(changed);
    }

    /// Entries in the requested order.
    pub fn entries(&self, order: SortOrder) -> Vec<PathBuf> {
        let iter = self.entries.iter().map(PathBuf::from);
        match order {
            SortOrder::Ascending => iter.collect(),
            SortOrder::Descending => iter.rev().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite `old` and every entry under it to live under `new`.
    ///
    /// Returns the number of entries rewritten.
    pub fn rebase(&mut self, old: &Path, new: &Path) -> usize {
        let affected = self.take_within(old);
        let count = affected.len();
        for path in affected {
            if let Some(moved) = rebase(&path, old, new) {
                self.entries.insert(moved.into_os_string());
            }
        }
        self.changed(count > 0);
        count
    }

    /// Drop `path` and every entry under it.
    pub fn purge(&mut self, path: &Path) -> usize {
        let count = self.take_within(path).len();
        self.changed(count > 0);
        count
    }

    fn take_within(&mut self, ancestor: &Path) -> Vec<PathBuf> {
        let affected: Vec<OsString> = self
            .entries
            .iter()
            .filter(|entry| is_within(Path::new(entry), ancestor))
            .cloned()
            .collect();
        for entry in &affected {
            self.entries.remove(entry);
        }
        affected.into_iter().map(PathBuf::from).collect()
    }

    fn changed(&self, changed: bool) -> bool {
        if changed {
            self.notifier.refresh();
        }
        changed
    }
}

fn key_for(path: &Path) -> Option<OsString> {
    match normalize_path(path) {
        Ok(path) => Some(path.into_os_string()),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring clipboard path");
            None
        }
    }
}

/// De-duplicate and order paths for a destructive batch.
///
/// Paths are compared as raw strings, descending, so `/a/dir/file` comes
/// before `/a/dir`.
pub fn descending(paths: &[PathBuf]) -> Vec<PathBuf> {
    let unique: BTreeSet<OsString> = paths
        .iter()
        .map(|path| {
            normalize_path(path)
                .unwrap_or_else(|_| path.clone())
                .into_os_string()
        })
        .collect();
    unique.into_iter().rev().map(PathBuf::from).collect()
}
