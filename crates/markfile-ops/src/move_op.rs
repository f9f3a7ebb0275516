//! Move operation.

use std::fs;
use std::path::{Path, PathBuf};

use markfile_core::{OpsError, Result};

use crate::clipboard::{descending, SortOrder};
use crate::conflict::{ReplaceRule, Resolution};
use crate::executor::{clear_for_rename, BatchExecutor, DestinationPlan};
use crate::progress::{OperationComplete, OperationType, Tally};
use crate::prompt::Prompter;

impl<P: Prompter> BatchExecutor<P> {
    /// Move `sources` to `destination` with an OS rename.
    ///
    /// Clipboard entries at or below a moved path follow it, and the
    /// notifier hears about every move. There is no copy-then-delete
    /// fallback: a cross-device move fails for that item.
    pub fn move_to(&mut self, sources: &[PathBuf], destination: &Path) -> OperationComplete {
        let sources = descending(sources);
        let mut tally = Tally::new(OperationType::Move, sources.len());
        if sources.is_empty() {
            return self.finish(tally);
        }

        let plan = match DestinationPlan::prepare(sources.len(), destination) {
            Ok(plan) => plan,
            Err(e) => return self.fail_batch(tally, destination, e),
        };

        for source in &sources {
            self.begin(&mut tally, source);
            match self.move_one(source, plan.target_for(source)) {
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

    /// Move every clipboard entry to `destination`.
    pub fn move_clipboard(&mut self, destination: &Path) -> OperationComplete {
        let sources = self.clipboard.entries(SortOrder::Descending);
        self.move_to(&sources, destination)
    }

    fn move_one(&mut self, source: &Path, target: PathBuf) -> Result<Option<u64>> {
        let metadata = fs::symlink_metadata(source).map_err(|e| OpsError::io(source, e))?;

        let Resolution::Proceed {
            destination,
            replace,
        } = self.resolve_conflict(source, target, ReplaceRule::RefuseNonEmptyDirectory)?
        else {
            return Ok(None);
        };

        if replace {
            clear_for_rename(&metadata, &destination)?;
        }
        self.rename_path(source, &destination)?;

        Ok(Some(if metadata.is_file() { metadata.len() } else { 0 }))
    }
}
