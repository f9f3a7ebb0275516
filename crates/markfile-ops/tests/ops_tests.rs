use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use markfile_core::OpsError;
use markfile_ops::{
    start_batch, BatchExecutor, Clipboard, CommitOutcome, FileOperation, OpenHandles,
    OperationResult, ScriptedPrompter, SnapshotEditor, SortOrder,
};
use tempfile::TempDir;

fn executor_with_handles(
    prompter: ScriptedPrompter,
) -> (BatchExecutor<ScriptedPrompter>, Arc<OpenHandles>) {
    let handles = Arc::new(OpenHandles::new());
    let executor = BatchExecutor::new(Clipboard::new(handles.clone()), prompter);
    (executor, handles)
}

/// `<root>/a/x.txt` plus the directory `<root>/a` itself.
fn nested_fixture() -> (TempDir, PathBuf, PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("a");
    fs::create_dir(&dir).unwrap();
    let file = dir.join("x.txt");
    fs::write(&file, "payload").unwrap();
    (temp, dir, file)
}

fn with_trailing_separator(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}/", path.display()))
}

#[test]
fn test_copy_nested_clipboard_entries() {
    let (temp, dir, file) = nested_fixture();
    let dest = temp.path().join("b");

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new());
    executor.clipboard_mut().extend([file.clone(), dir.clone()]);

    let complete = executor.copy_clipboard(&with_trailing_separator(&dest));

    assert!(complete.is_success(), "{:?}", complete.errors);
    assert_eq!(complete.succeeded, 2);
    assert_eq!(fs::read_to_string(dest.join("x.txt")).unwrap(), "payload");
    assert_eq!(fs::read_to_string(dest.join("a/x.txt")).unwrap(), "payload");
    // copying leaves the clipboard alone
    assert_eq!(
        executor.clipboard().entries(SortOrder::Ascending),
        [dir, file]
    );
}

#[test]
fn test_delete_clipboard_discards_open_handles() {
    let (temp, dir, file) = nested_fixture();
    fs::create_dir(dir.join("sub")).unwrap();
    fs::write(dir.join("sub/file"), "x").unwrap();
    let unrelated = temp.path().join("keep.txt");
    fs::write(&unrelated, "x").unwrap();

    let (mut executor, handles) = executor_with_handles(ScriptedPrompter::new());
    handles.open(&file);
    handles.open(&unrelated);
    executor.clipboard_mut().add(&dir);

    let complete = executor.delete_clipboard();

    assert!(complete.is_success());
    assert!(fs::symlink_metadata(&dir).is_err());
    assert!(executor.clipboard().is_empty());
    assert_eq!(handles.paths(), [unrelated]);
}

#[test]
fn test_move_overwrite_repoints_references() {
    let temp = tempfile::tempdir().unwrap();
    let old = temp.path().join("old.txt");
    let new = temp.path().join("new.txt");
    fs::write(&old, "old content").unwrap();
    fs::write(&new, "to be replaced").unwrap();

    let (mut executor, handles) =
        executor_with_handles(ScriptedPrompter::new().choose("Overwrite"));
    handles.open(&old);
    handles.set_pending(&old, "unsaved edits");
    executor.clipboard_mut().add(&old);

    let complete = executor.move_to(&[old.clone()], &new);

    assert!(complete.is_success(), "{:?}", complete.errors);
    assert!(!old.exists());
    assert_eq!(fs::read_to_string(&new).unwrap(), "unsaved edits");
    assert_eq!(handles.paths(), [new.clone()]);
    assert_eq!(executor.clipboard().entries(SortOrder::Ascending), [new]);
}

#[test]
fn test_rename_onto_non_empty_directory_always_fails() {
    for answer in ["Overwrite", "Skip", "Rename"] {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("source");
        fs::create_dir(&source).unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inside.txt"), "x").unwrap();

        let (mut executor, _) = executor_with_handles(
            ScriptedPrompter::new().choose(answer).type_text("elsewhere"),
        );
        let err = executor.rename(&source, &target).unwrap_err();

        assert!(matches!(err, OpsError::NonEmptyDirectory { .. }), "{answer}");
        assert!(source.exists());
        assert!(target.join("inside.txt").exists());
    }
}

#[test]
fn test_move_rename_answer_inside_source_is_refused() {
    let (temp, dir, file) = nested_fixture();
    let out = temp.path().join("out");
    fs::create_dir_all(out.join("a")).unwrap();

    let prompter = ScriptedPrompter::new()
        .choose("Rename")
        .type_text(dir.join("moved").to_string_lossy());
    let (mut executor, _) = executor_with_handles(prompter);
    let complete = executor.move_to(&[dir.clone()], &out);

    assert_eq!(complete.failed, 1);
    assert!(file.exists());
    assert!(!dir.join("moved").exists());
    assert_eq!(executor.prompter().pending(), 0);
}

#[test]
fn test_rename_onto_ancestor_is_refused() {
    let (temp, dir, _) = nested_fixture();
    let nested = dir.join("a");
    fs::create_dir(&nested).unwrap();

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("Overwrite"));
    let err = executor.rename(&nested, &dir).unwrap_err();

    assert!(matches!(err, OpsError::DestinationIsAncestor { .. }));
    assert!(nested.is_dir());
    assert!(temp.path().join("a/x.txt").exists());
}

#[test]
fn test_unchanged_commit_does_nothing() {
    let (_temp, dir, file) = nested_fixture();
    let (mut executor, handles) = executor_with_handles(ScriptedPrompter::new());
    executor.clipboard_mut().extend([dir.clone(), file.clone()]);
    let refreshes = handles.refresh_count();

    let mut editor = SnapshotEditor::default();
    let review = editor.open_clipboard_review(executor.clipboard());
    let outcome = editor
        .commit(review.id, &review.text(), &mut executor)
        .unwrap();
    assert!(matches!(outcome, CommitOutcome::Unchanged));

    // blank lines and comments do not count as edits
    let rename = editor.open_rename(&[file.clone()]);
    let text = format!("\n# extra note\n{}\n\n", file.display());
    let outcome = editor.commit(rename.id, &text, &mut executor).unwrap();
    assert!(matches!(outcome, CommitOutcome::Unchanged));

    assert_eq!(handles.refresh_count(), refreshes);
    assert!(executor.prompter().prompts.is_empty());
    assert_eq!(executor.clipboard().len(), 2);
    assert!(file.exists());
}

#[test]
fn test_clipboard_review_replaces_with_existing_lines() {
    let (temp, dir, file) = nested_fixture();
    let other = temp.path().join("other.txt");
    fs::write(&other, "x").unwrap();

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("Yes"));
    executor.clipboard_mut().extend([dir.clone(), file.clone()]);

    let mut editor = SnapshotEditor::default();
    let surface = editor.open_clipboard_review(executor.clipboard());
    let text = format!(
        "{}\n{}/\n{}\n",
        file.display(),
        other.display(),
        temp.path().join("missing.txt").display()
    );

    let outcome = editor.commit(surface.id, &text, &mut executor).unwrap();

    assert!(matches!(
        outcome,
        CommitOutcome::ClipboardReplaced { entries: 2 }
    ));
    assert_eq!(
        executor.clipboard().entries(SortOrder::Ascending),
        [file, other]
    );
    assert!(dir.exists());
}

#[test]
fn test_clipboard_review_declined() {
    let (_temp, dir, file) = nested_fixture();
    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("No"));
    executor.clipboard_mut().extend([dir.clone(), file.clone()]);

    let mut editor = SnapshotEditor::default();
    let surface = editor.open_clipboard_review(executor.clipboard());
    let outcome = editor
        .commit(surface.id, &format!("{}\n", dir.display()), &mut executor)
        .unwrap();

    assert!(matches!(outcome, CommitOutcome::Declined));
    assert_eq!(executor.clipboard().len(), 2);
}

#[test]
fn test_rename_commit_with_diff() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let (mut executor, _) =
        executor_with_handles(ScriptedPrompter::new().choose("Diff").choose("Yes"));
    executor.clipboard_mut().add(&b);

    let mut editor = SnapshotEditor::default();
    let surface = editor.open_rename(&[a.clone(), b.clone()]);
    // a relative line lands next to the original
    let text = format!("{}\nc.txt\n", a.display());

    let outcome = editor.commit(surface.id, &text, &mut executor).unwrap();

    let CommitOutcome::Renamed(complete) = outcome else {
        panic!("expected renames, got {outcome:?}");
    };
    let c = temp.path().join("c.txt");
    assert_eq!(complete.succeeded, 1);
    assert_eq!(fs::read_to_string(&c).unwrap(), "b");
    assert!(a.exists());
    assert!(!b.exists());
    assert!(executor.clipboard().contains(&c));
    assert_eq!(
        executor.prompter().reports,
        [format!("{} --> {}", b.display(), c.display())]
    );
    assert_eq!(executor.prompter().prompts.len(), 2);
}

#[test]
fn test_rename_commit_follows_line_order() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("Yes"));
    let mut editor = SnapshotEditor::default();
    // b moves out of the way before a takes its name
    let surface = editor.open_rename(&[b.clone(), a.clone()]);
    let text = format!(
        "{}\n{}\n",
        temp.path().join("c.txt").display(),
        b.display()
    );

    let outcome = editor.commit(surface.id, &text, &mut executor).unwrap();

    let CommitOutcome::Renamed(complete) = outcome else {
        panic!("expected renames, got {outcome:?}");
    };
    assert!(complete.is_success());
    assert_eq!(fs::read_to_string(temp.path().join("c.txt")).unwrap(), "b");
    assert_eq!(fs::read_to_string(&b).unwrap(), "a");
    assert!(!a.exists());
}

#[test]
fn test_rename_commit_line_mismatch_closes_surface() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("Yes"));
    let mut editor = SnapshotEditor::default();
    let surface = editor.open_rename(&[a.clone(), b.clone()]);

    let err = editor
        .commit(surface.id, &format!("{}\n", a.display()), &mut executor)
        .unwrap_err();
    assert!(matches!(
        err,
        OpsError::LineCountMismatch {
            expected: 2,
            found: 1
        }
    ));
    assert!(!editor.is_open(surface.id));

    let again = editor
        .commit(surface.id, &format!("{}\n", a.display()), &mut executor)
        .unwrap();
    assert!(matches!(again, CommitOutcome::Closed));
    assert!(a.exists() && b.exists());
}

#[test]
fn test_second_commit_is_a_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    fs::write(&a, "a").unwrap();

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new().choose("Yes"));
    let mut editor = SnapshotEditor::default();
    let surface = editor.open_rename(&[a.clone()]);

    let first = editor.commit(surface.id, "renamed.txt\n", &mut executor).unwrap();
    assert!(matches!(first, CommitOutcome::Renamed(_)));

    let second = editor.commit(surface.id, "again.txt\n", &mut executor).unwrap();
    assert!(matches!(second, CommitOutcome::Closed));
    assert!(temp.path().join("renamed.txt").exists());
    assert!(!temp.path().join("again.txt").exists());
}

#[test]
fn test_delete_continues_after_failure_by_default() {
    let temp = tempfile::tempdir().unwrap();
    let first = temp.path().join("a.txt");
    let last = temp.path().join("c.txt");
    fs::write(&first, "x").unwrap();
    fs::write(&last, "x").unwrap();
    let missing = temp.path().join("b.txt");

    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new());
    let complete = executor.delete(&[first.clone(), missing, last.clone()]);

    assert_eq!(complete.succeeded, 2);
    assert_eq!(complete.failed, 1);
    assert!(!complete.aborted);
    assert!(!first.exists() && !last.exists());
    assert_eq!(executor.prompter().reports.len(), 1);
    assert_eq!(executor.prompter().prompts.len(), 1);
}

#[test]
fn test_execute_create_operations() {
    let temp = tempfile::tempdir().unwrap();
    let (mut executor, _) = executor_with_handles(ScriptedPrompter::new());

    let file = temp.path().join("deep/new.txt");
    let complete = executor.execute(&FileOperation::create_file(file.clone()));
    assert!(complete.is_success());
    assert!(file.is_file());

    let complete = executor.execute(&FileOperation::create_file(file));
    assert_eq!(complete.failed, 1);

    let dir = temp.path().join("made");
    let complete = executor.execute(&FileOperation::create_directory(dir.clone()));
    assert!(complete.is_success());
    assert!(dir.is_dir());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_batch_processes_descendant_first() {
    let (temp, dir, file) = nested_fixture();
    let dest = temp.path().join("b");

    let (executor, handles) = executor_with_handles(ScriptedPrompter::new());
    let operation = FileOperation::copy(vec![dir.clone(), file.clone()], dest.clone());

    let (mut rx, handle) = start_batch(executor, operation);

    let mut order = Vec::new();
    let mut summary = None;
    while let Some(event) = rx.recv().await {
        match event {
            OperationResult::Progress(progress) => order.extend(progress.current),
            OperationResult::Conflict(conflict) => panic!("unexpected {conflict:?}"),
            OperationResult::Complete(complete) => summary = Some(complete.summary()),
        }
    }

    handle.await.unwrap();
    assert_eq!(order, [file, dir]);
    assert_eq!(summary.as_deref(), Some("Copied 2 items"));
    assert!(dest.join("a/x.txt").exists());
    assert!(handles.refresh_count() >= 1);
}
