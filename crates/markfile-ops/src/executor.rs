//! Batch executor: runs copy, move, delete, rename and create over lists of
//! paths, one item at a time.
//!
//! Each operation lives in its own module as an `impl BatchExecutor` block;
//! this module holds the state they share and the per-item bookkeeping.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use markfile_core::{
    basename, has_trailing_separator, normalize_path, OpsConfig, OpsError, Result,
};

use crate::clipboard::Clipboard;
use crate::conflict::{ConflictResolver, ReplaceRule, Resolution};
use crate::materialize::ensure_parent_dirs;
use crate::notify::Notifier;
use crate::operation::{FileOperation, OperationError, PendingRename};
use crate::progress::{OperationComplete, OperationResult, OperationType, Tally};
use crate::prompt::{ask, Prompter, YesNo};
use crate::OPERATION_CHANNEL_SIZE;

/// Runs file operations against a clipboard, asking a prompter whenever
/// a decision is needed.
///
/// Items are processed strictly one after another. The clipboard is
/// updated in the same step as the filesystem change that affects it.
#[derive(Debug)]
pub struct BatchExecutor<P> {
    pub(crate) clipboard: Clipboard,
    pub(crate) prompter: P,
    pub(crate) config: OpsConfig,
    events: Option<mpsc::Sender<OperationResult>>,
}

impl<P: Prompter> BatchExecutor<P> {
    /// Create an executor with default settings.
    pub fn new(clipboard: Clipboard, prompter: P) -> Self {
        Self {
            clipboard,
            prompter,
            config: OpsConfig::default(),
            events: None,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: OpsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    pub fn config(&self) -> &OpsConfig {
        &self.config
    }

    /// Take the executor apart.
    pub fn into_parts(self) -> (Clipboard, P) {
        (self.clipboard, self.prompter)
    }

    /// Execute any operation and report how it went.
    pub fn execute(&mut self, operation: &FileOperation) -> OperationComplete {
        match operation {
            FileOperation::Copy {
                sources,
                destination,
            } => self.copy(sources, destination),
            FileOperation::Move {
                sources,
                destination,
            } => self.move_to(sources, destination),
            FileOperation::Rename {
                source,
                destination,
            } => self.rename_batch(&[PendingRename::new(source.clone(), destination.clone())]),
            FileOperation::RenameBatch { renames } => self.rename_batch(renames),
            FileOperation::Delete { targets } => self.delete(targets),
            FileOperation::CreateFile { path } => {
                self.run_single(OperationType::CreateFile, path, |this| {
                    this.create_file(path).map(|_| 0)
                })
            }
            FileOperation::CreateDirectory { path } => {
                self.run_single(OperationType::CreateDirectory, path, |this| {
                    this.create_directory(path).map(|_| 0)
                })
            }
        }
    }

    fn run_single(
        &mut self,
        operation_type: OperationType,
        item: &Path,
        run: impl FnOnce(&mut Self) -> Result<u64>,
    ) -> OperationComplete {
        let mut tally = Tally::new(operation_type, 1);
        self.begin(&mut tally, item);
        match run(self) {
            Ok(bytes) => tally.succeed(bytes),
            Err(e) => {
                self.item_failed(&mut tally, item, e, false);
            }
        }
        self.finish(tally)
    }

    pub(crate) fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(self.clipboard.notifier())
    }

    fn emit(&self, event: OperationResult) {
        if let Some(tx) = &self.events {
            let _ = tx.blocking_send(event);
        }
    }

    /// Mark `item` as the one being worked on.
    pub(crate) fn begin(&self, tally: &mut Tally, item: &Path) {
        tally.start(item);
        self.emit(OperationResult::Progress(tally.progress.clone()));
    }

    /// Record a failed item and ask whether to go on.
    ///
    /// A cancellation counts as a skip and never prompts. Returns `false`
    /// when the batch should stop.
    pub(crate) fn item_failed(
        &mut self,
        tally: &mut Tally,
        item: &Path,
        error: OpsError,
        continue_default: bool,
    ) -> bool {
        if error.is_cancelled() {
            tally.skip();
            return true;
        }

        tracing::warn!(item = %item.display(), error = %error, "item failed");
        let failure = OperationError::from_ops(item, &error);
        self.prompter.report(&failure.to_string());
        tally.fail(failure);

        let remaining = tally.remaining();
        if remaining == 0 {
            return true;
        }

        let answer = ask(
            &mut self.prompter,
            &format!("Continue with the remaining {remaining} item(s)?"),
            YesNo::from_bool(continue_default),
        );
        if !answer.is_yes() {
            tally.abort();
            return false;
        }
        true
    }

    /// Fail every item of a batch that cannot start at all.
    pub(crate) fn fail_batch(&mut self, mut tally: Tally, item: &Path, error: OpsError) -> OperationComplete {
        tracing::warn!(item = %item.display(), error = %error, "batch failed before starting");
        let failure = OperationError::from_ops(item, &error);
        self.prompter.report(&failure.to_string());
        tally.fail_remaining(failure);
        self.finish(tally)
    }

    /// Close a batch: refresh the view and publish the result.
    pub(crate) fn finish(&self, tally: Tally) -> OperationComplete {
        let complete = tally.finish();
        self.clipboard.notifier().refresh();
        tracing::info!(summary = %complete.summary(), "batch complete");
        self.emit(OperationResult::Complete(complete.clone()));
        complete
    }

    /// Run the conflict protocol for one destination.
    pub(crate) fn resolve_conflict(
        &mut self,
        source: &Path,
        target: PathBuf,
        rule: ReplaceRule,
    ) -> Result<Resolution> {
        let events = self.events.clone();
        let policy = self.config.conflict_policy;
        let mut resolver = ConflictResolver::new(&mut self.prompter, policy);
        resolver.resolve(source, target, rule, |conflict| {
            if let Some(tx) = &events {
                let _ = tx.blocking_send(OperationResult::Conflict(conflict.clone()));
            }
        })
    }

    /// Rename `source` to `destination` and repoint everything tracking it.
    pub(crate) fn rename_path(&mut self, source: &Path, destination: &Path) -> Result<()> {
        fs::rename(source, destination).map_err(|e| OpsError::io(source, e))?;
        tracing::debug!(from = %source.display(), to = %destination.display(), "renamed");
        self.clipboard.rebase(source, destination);
        self.notifier().path_moved(source, destination);
        Ok(())
    }
}

/// Where the items of a copy or move land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DestinationPlan {
    /// Each source goes to `dir/basename(source)`.
    Into(PathBuf),
    /// The single source goes to exactly this path.
    Exact(PathBuf),
}

impl DestinationPlan {
    /// Decide how `destination` is meant, creating it if it is a new directory.
    ///
    /// It is a directory when it already is one, when it was written with a
    /// trailing separator, or when there are several sources.
    pub(crate) fn prepare(source_count: usize, destination: &Path) -> Result<Self> {
        let wants_dir = has_trailing_separator(destination) || source_count > 1;
        let destination = normalize_path(destination)?;

        if destination.is_dir() {
            return Ok(Self::Into(destination));
        }
        if !wants_dir {
            return Ok(Self::Exact(destination));
        }

        ensure_parent_dirs(&destination)?;
        fs::create_dir(&destination).map_err(|e| OpsError::io(&destination, e))?;
        tracing::debug!(path = %destination.display(), "created destination directory");
        Ok(Self::Into(destination))
    }

    pub(crate) fn target_for(&self, source: &Path) -> PathBuf {
        match self {
            Self::Into(dir) => dir.join(basename(source)),
            Self::Exact(path) => path.clone(),
        }
    }
}

/// Make room at `destination` so an OS rename of `source` can replace it.
///
/// Files are replaced atomically by the rename itself; an (empty)
/// directory, or a file about to be replaced by a directory, is removed
/// first.
pub(crate) fn clear_for_rename(source: &fs::Metadata, destination: &Path) -> Result<()> {
    let existing = fs::symlink_metadata(destination).map_err(|e| OpsError::io(destination, e))?;
    if existing.is_dir() {
        fs::remove_dir(destination).map_err(|e| OpsError::io(destination, e))?;
    } else if source.is_dir() {
        fs::remove_file(destination).map_err(|e| OpsError::io(destination, e))?;
    }
    Ok(())
}

/// Run a whole operation on a blocking task, streaming progress events.
///
/// The batch still runs strictly sequentially; the join handle gives the
/// executor (and its clipboard) back once the batch is done.
pub fn start_batch<P>(
    mut executor: BatchExecutor<P>,
    operation: FileOperation,
) -> (
    mpsc::Receiver<OperationResult>,
    JoinHandle<BatchExecutor<P>>,
)
where
    P: Prompter + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    let handle = tokio::task::spawn_blocking(move || {
        executor.events = Some(tx);
        executor.execute(&operation);
        executor.events = None;
        executor
    });

    (rx, handle)
}
