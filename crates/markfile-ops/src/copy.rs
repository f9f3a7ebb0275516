//! Copy operation.

use std::fs;
use std::path::{Path, PathBuf};

use markfile_core::{OpsError, Result};

use crate::clipboard::{descending, SortOrder};
use crate::conflict::{ReplaceRule, Resolution};
use crate::executor::{BatchExecutor, DestinationPlan};
use crate::progress::{OperationComplete, OperationType, Tally};
use crate::prompt::Prompter;
use crate::walker::{copy_tree, delete_tree};

impl<P: Prompter> BatchExecutor<P> {
    /// Copy `sources` to `destination`.
    ///
    /// Sources are processed in descending path order. The clipboard is
    /// left as it was.
    pub fn copy(&mut self, sources: &[PathBuf], destination: &Path) -> OperationComplete {
        let sources = descending(sources);
        let mut tally = Tally::new(OperationType::Copy, sources.len());
        if sources.is_empty() {
            return self.finish(tally);
        }

        let plan = match DestinationPlan::prepare(sources.len(), destination) {
            Ok(plan) => plan,
            Err(e) => return self.fail_batch(tally, destination, e),
        };

        for source in &sources {
            self.begin(&mut tally, source);
            match self.copy_one(source, plan.target_for(source)) {
                Ok(Some(bytes)) => tally.succeed(bytes),
                Ok(None) => tally.skip(),
                Err(e) => {
                    let go_on = self.config.batch_continue_default;
                    if !self.item_failed(&mut tally, source, e, go_on) {
                        break;
                    }
                }
            }
        }

        self.finish(tally)
    }

    /// Copy every clipboard entry to `destination`.
    pub fn copy_clipboard(&mut self, destination: &Path) -> OperationComplete {
        let sources = self.clipboard.entries(SortOrder::Descending);
        self.copy(&sources, destination)
    }

    /// Copy one item; `None` means the user skipped it.
    fn copy_one(&mut self, source: &Path, target: PathBuf) -> Result<Option<u64>> {
        fs::symlink_metadata(source).map_err(|e| OpsError::io(source, e))?;

        let Resolution::Proceed {
            destination,
            replace,
        } = self.resolve_conflict(source, target, ReplaceRule::Any)?
        else {
            return Ok(None);
        };

        if replace {
            delete_tree(&destination)?;
        }
        let bytes = copy_tree(source, &destination, self.config.preserve_permissions)?;
        tracing::debug!(from = %source.display(), to = %destination.display(), bytes, "copied");
        Ok(Some(bytes))
    }
}
