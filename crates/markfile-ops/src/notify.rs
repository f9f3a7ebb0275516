//! Notifications to collaborators that track paths the engine mutates.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use markfile_core::{is_within, rebase};

/// Receiver of path changes and view refresh signals.
///
/// Handles are matched by prefix: a move of `/a` also repoints `/a/b`.
pub trait Notifier: Send + Sync {
    /// `old` (and everything under it) now lives at `new`.
    fn path_moved(&self, _old: &Path, _new: &Path) {}

    /// `path` (and everything under it) is gone.
    fn path_deleted(&self, _path: &Path) {}

    /// Marked state or directory listings changed.
    fn refresh(&self) {}
}

/// Notifier that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {}

/// An open handle on a path, e.g. an editor buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenHandle {
    /// Unsaved content, written out at the new location on a move.
    pub pending: Option<Vec<u8>>,
}

/// In-process registry of open handles.
#[derive(Debug, Default)]
pub struct OpenHandles {
    handles: Mutex<BTreeMap<PathBuf, OpenHandle>>,
    refreshes: AtomicUsize,
}

impl OpenHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle on `path`.
    pub fn open(&self, path: impl Into<PathBuf>) {
        self.lock().entry(path.into()).or_default();
    }

    /// Attach unsaved content to the handle on `path`.
    pub fn set_pending(&self, path: &Path, content: impl Into<Vec<u8>>) {
        if let Some(handle) = self.lock().get_mut(path) {
            handle.pending = Some(content.into());
        }
    }

    /// Paths with an open handle, in ascending order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Number of refresh signals received.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, OpenHandle>> {
        // A poisoned registry still holds valid paths.
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for OpenHandles {
    fn path_moved(&self, old: &Path, new: &Path) {
        let mut handles = self.lock();
        let affected: Vec<PathBuf> = handles
            .keys()
            .filter(|path| is_within(path, old))
            .cloned()
            .collect();

        for path in affected {
            let Some(mut handle) = handles.remove(&path) else {
                continue;
            };
            let Some(target) = rebase(&path, old, new) else {
                continue;
            };

            if let Some(content) = handle.pending.take() {
                if let Err(e) = fs::write(&target, &content) {
                    tracing::warn!(path = %target.display(), error = %e, "failed to persist pending content");
                    handle.pending = Some(content);
                }
            }
            tracing::debug!(from = %path.display(), to = %target.display(), "repointed handle");
            handles.insert(target, handle);
        }
    }

    fn path_deleted(&self, path: &Path) {
        self.lock().retain(|open, _| !is_within(open, path));
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }
}
