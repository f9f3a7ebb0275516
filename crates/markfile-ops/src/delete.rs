//! Delete operation.

use std::fs;
use std::path::{Path, PathBuf};

use markfile_core::{is_within, normalize_path, Result};

use crate::clipboard::{descending, SortOrder};
use crate::executor::BatchExecutor;
use crate::progress::{OperationComplete, OperationType, Tally};
use crate::prompt::Prompter;
use crate::walker::delete_tree;

impl<P: Prompter> BatchExecutor<P> {
    /// Permanently delete `targets`, deepest paths first.
    ///
    /// Deleted paths are dropped from the clipboard and reported to the
    /// notifier. After a failure the user is asked whether to continue
    /// (default from `delete_continue_default`).
    pub fn delete(&mut self, targets: &[PathBuf]) -> OperationComplete {
        let targets = descending(targets);
        let mut tally = Tally::new(OperationType::Delete, targets.len());

        for target in &targets {
            self.begin(&mut tally, target);
            match self.delete_one(target) {
                Ok(()) => tally.succeed(0),
                Err(e) => {
                    let go_on = self.config.delete_continue_default;
                    if !self.item_failed(&mut tally, target, e, go_on) {
                        break;
                    }
                }
            }
        }

        self.finish(tally)
    }

    /// Delete every clipboard entry.
    pub fn delete_clipboard(&mut self) -> OperationComplete {
        let targets = self.clipboard.entries(SortOrder::Descending);
        self.delete(&targets)
    }

    fn delete_one(&mut self, target: &Path) -> Result<()> {
        let target = normalize_path(target)?;
        if let Err(e) = delete_tree(&target) {
            self.forget_vanished(&target);
            return Err(e);
        }

        tracing::debug!(path = %target.display(), "deleted");
        self.clipboard.purge(&target);
        self.notifier().path_deleted(&target);
        Ok(())
    }

    /// After a partial delete, drop the clipboard entries that did go away.
    fn forget_vanished(&mut self, target: &Path) {
        let vanished: Vec<PathBuf> = self
            .clipboard
            .entries(SortOrder::Descending)
            .into_iter()
            .filter(|entry| is_within(entry, target) && fs::symlink_metadata(entry).is_err())
            .collect();

        let notifier = self.notifier();
        for path in vanished {
            self.clipboard.remove(&path);
            notifier.path_deleted(&path);
        }
    }
}
