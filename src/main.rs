//! markfile - clipboard-driven file operations from the command line.
//!
//! Usage:
//!   mkf copy SOURCES... DEST     Copy into DEST (a directory, or an exact path)
//!   mkf move SOURCES... DEST     Move into DEST
//!   mkf delete PATHS...          Delete permanently
//!   mkf rename PATH NEW          Rename PATH to NEW (a name or a path)
//!   mkf edit PATHS...            Bulk rename in $EDITOR
//!   mkf mkdir PATH / touch PATH  Create a directory / an empty file
//!   mkf info PATHS...            Show metadata

mod settings;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::Command as Process;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Context, Result};
use tracing_subscriber::EnvFilter;

use markfile_core::{ConflictPolicy, MetadataReport};
use markfile_ops::{
    start_batch, BatchExecutor, Clipboard, CommitOutcome, DefaultPrompter, FileOperation,
    OperationComplete, OperationResult, Prompter, RenameOutcome, SnapshotEditor,
};

use crate::settings::Settings;
use crate::terminal::TerminalPrompter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MARKFILE_LOG";

#[derive(Parser)]
#[command(
    name = "markfile",
    version,
    about = "Copy, move, delete and bulk rename file trees",
    long_about = "markfile runs batch file operations one item at a time, asking \
                  before it overwrites anything and after anything fails."
)]
struct Cli {
    /// Settings file (defaults to <config dir>/markfile/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How to answer destination conflicts
    #[arg(long, global = true)]
    on_conflict: Option<ConflictArg>,

    /// Never prompt: take every default answer
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files and directories
    Copy {
        /// Sources followed by the destination
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
    },

    /// Move files and directories
    Move {
        /// Sources followed by the destination
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
    },

    /// Delete files and directories permanently
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Rename one path
    Rename {
        path: PathBuf,
        /// New name in the same directory, or a full new path
        new: String,
    },

    /// Bulk rename paths in a text editor
    Edit {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Create a directory
    Mkdir { path: PathBuf },

    /// Create an empty file
    Touch { path: PathBuf },

    /// Show metadata
    Info {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConflictArg {
    Ask,
    Overwrite,
    Skip,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Ask => Self::Ask,
            ConflictArg::Overwrite => Self::Overwrite,
            ConflictArg::Skip => Self::Skip,
        }
    }
}

type Executor = BatchExecutor<Box<dyn Prompter + Send>>;

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(policy) = cli.on_conflict {
        settings.ops.conflict_policy = policy.into();
    }

    let prompter: Box<dyn Prompter + Send> = if cli.yes {
        Box::new(DefaultPrompter)
    } else {
        Box::new(TerminalPrompter)
    };
    let mut executor = BatchExecutor::new(Clipboard::default(), prompter).with_config(settings.ops.clone());

    match cli.command {
        Command::Copy { paths } => {
            let (sources, destination) = split_destination(&paths)?;
            run_batch(executor, FileOperation::copy(sources, destination))?;
        }
        Command::Move { paths } => {
            let (sources, destination) = split_destination(&paths)?;
            run_batch(executor, FileOperation::move_to(sources, destination))?;
        }
        Command::Delete { paths } => {
            let targets = absolute_all(&paths)?;
            run_batch(executor, FileOperation::delete(targets))?;
        }
        Command::Rename { path, new } => {
            run_rename(&mut executor, &absolute(&path)?, &new)?;
        }
        Command::Edit { paths } => {
            run_edit(&mut executor, &settings, &absolute_all(&paths)?)?;
        }
        Command::Mkdir { path } => {
            let created = executor.create_directory(&absolute(&path)?)?;
            println!("Created {}", created.display());
        }
        Command::Touch { path } => {
            let created = executor.create_file(&absolute(&path)?)?;
            println!("Created {}", created.display());
        }
        Command::Info { paths } => {
            run_info(&absolute_all(&paths)?)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to init tracing subscriber: {e}");
    }
}

/// Make a command-line path absolute, keeping any trailing separator.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Cannot read the current directory")?;
    Ok(cwd.join(path))
}

fn absolute_all(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|path| absolute(path)).collect()
}

fn split_destination(paths: &[PathBuf]) -> Result<(Vec<PathBuf>, PathBuf)> {
    let (destination, sources) = paths
        .split_last()
        .ok_or_else(|| eyre!("Missing destination"))?;
    Ok((absolute_all(sources)?, absolute(destination)?))
}

/// Run a batch on a blocking task and print its progress.
fn run_batch(executor: Executor, operation: FileOperation) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let complete = runtime.block_on(async move {
        let (mut rx, handle) = start_batch(executor, operation);
        let mut complete = None;

        while let Some(event) = rx.recv().await {
            match event {
                OperationResult::Progress(progress) => {
                    if let Some(current) = &progress.current {
                        eprintln!(
                            "[{}/{}] {} {}",
                            progress.items_completed + 1,
                            progress.items_total,
                            progress.operation_type,
                            current.display()
                        );
                    }
                }
                OperationResult::Conflict(conflict) => {
                    tracing::debug!(destination = %conflict.destination.display(), "conflict");
                }
                OperationResult::Complete(done) => complete = Some(done),
            }
        }

        handle.await.context("Batch task panicked")?;
        complete.ok_or_else(|| eyre!("Batch ended without a result"))
    })?;

    report(&complete)
}

fn report(complete: &OperationComplete) -> Result<()> {
    let mut line = complete.summary();
    if complete.bytes_processed > 0 {
        line.push_str(&format!(
            " ({})",
            humansize::format_size(complete.bytes_processed, humansize::DECIMAL)
        ));
    }
    println!("{line}");

    for error in &complete.errors {
        eprintln!("  {error}");
    }
    if !complete.is_success() {
        bail!("{} failed", complete.operation_type);
    }
    Ok(())
}

fn run_rename(executor: &mut Executor, path: &Path, new: &str) -> Result<()> {
    let outcome = if new.contains(std::path::is_separator) {
        executor.rename(path, &absolute(Path::new(new))?)?
    } else {
        executor.rename_in_place(path, new)?
    };

    match outcome {
        RenameOutcome::Renamed(destination) => println!("Renamed to {}", destination.display()),
        RenameOutcome::Unchanged => println!("Nothing to rename"),
        RenameOutcome::Skipped => println!("Skipped"),
    }
    Ok(())
}

/// Open the paths in an editor and apply the edited list as renames.
fn run_edit(executor: &mut Executor, settings: &Settings, paths: &[PathBuf]) -> Result<()> {
    let mut editor = SnapshotEditor::new(&settings.ops);
    let surface = editor.open_rename(paths);

    let file = tempfile::Builder::new()
        .prefix("markfile-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create a temporary file")?;
    std::fs::write(file.path(), surface.text()).context("Failed to write the rename list")?;

    let command = settings.editor_command();
    let mut words = command.split_whitespace();
    let program = words.next().ok_or_else(|| eyre!("Empty editor command"))?;
    let status = Process::new(program)
        .args(words)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch {program}"))?;

    if !status.success() {
        editor.discard(surface.id);
        bail!("{program} exited with {status}; nothing renamed");
    }

    let text = std::fs::read_to_string(file.path()).context("Failed to read the rename list")?;
    match editor.commit(surface.id, &text, executor)? {
        CommitOutcome::Renamed(complete) => report(&complete),
        CommitOutcome::Unchanged => {
            println!("Nothing to rename");
            Ok(())
        }
        CommitOutcome::Declined => {
            println!("Cancelled");
            Ok(())
        }
        CommitOutcome::ClipboardReplaced { .. } | CommitOutcome::Closed => Ok(()),
    }
}

fn run_info(paths: &[PathBuf]) -> Result<()> {
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let report = MetadataReport::read(path)?;
        for line in report.summary_lines() {
            println!("{line}");
        }
    }
    Ok(())
}
