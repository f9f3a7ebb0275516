//! Batch file operations engine for markfile.
//!
//! A [`BatchExecutor`] owns the [`Clipboard`] of marked paths and runs
//! copy, move, delete and rename over it one item at a time, asking a
//! [`Prompter`] on conflicts and after failures. A [`SnapshotEditor`]
//! turns an edited text list back into clipboard changes or renames.
//!
//! Everything here is synchronous. Async hosts use [`start_batch`] to run
//! a whole batch on a blocking task and watch its progress over a channel.

mod clipboard;
mod conflict;
mod copy;
mod create;
mod delete;
mod executor;
mod materialize;
mod move_op;
mod notify;
mod operation;
mod progress;
mod prompt;
mod rename;
mod snapshot;
mod walker;

pub use clipboard::{descending, Clipboard, SortOrder};
pub use conflict::{is_empty_dir, Conflict, ConflictKind, ConflictResolver, ReplaceRule, Resolution};
pub use executor::{start_batch, BatchExecutor};
pub use materialize::{ensure_parent_dirs, CreatedPathInfo};
pub use notify::{Notifier, NullNotifier, OpenHandle, OpenHandles};
pub use operation::{pair_positionally, FileOperation, OperationError, PendingRename};
pub use progress::{OperationComplete, OperationProgress, OperationResult, OperationType};
pub use prompt::{
    ask, Choice, CommitChoice, DefaultPrompter, OverwriteChoice, Prompter, ScriptedPrompter, YesNo,
};
pub use rename::{validate_filename, RenameOutcome};
pub use snapshot::{CommitOutcome, EditMode, EditSurface, SnapshotEditor, SurfaceId};
pub use walker::{copy_tree, delete_tree, delete_tree_with};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
