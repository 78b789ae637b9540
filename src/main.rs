//! burrow - browse, search, analyze and batch-edit local files.
//!
//! Usage:
//!   burrow ls [PATH]                 List a directory
//!   burrow search ROOT QUERY         Recursive name search
//!   burrow analyze [PATH]            Storage totals per category
//!   burrow df [PATH]                 Volume usage
//!   burrow cp|mv SOURCES... DEST     Batch copy or move
//!   burrow zip SOURCES... -o FILE    Compress into a zip archive
//!   burrow unzip ARCHIVE [DEST]      Extract a zip archive
//!   burrow --help                    Show help

mod logging;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Context, Result};
use tracing::debug;

use burrow_core::{format_size, SortDirection, SortKey, SortOrder};
use burrow_ops::{
    ConflictPolicy, ExecutorConfig, OperationEvent, OperationExecutor, OperationHandle,
    OperationKind, OperationRequest, Outcome, Password, ProgressEvent,
};
use burrow_scan::{AccessObserver, BrowseConfig, Browser, Entry};

#[derive(Parser)]
#[command(
    name = "burrow",
    version,
    about = "Browse, search, analyze and batch-edit local files",
    long_about = "burrow lists and searches directories, reports where storage goes, \
                  and runs cancellable batch operations (copy, move, delete, zip, unzip).\n\n\
                  Set BURROW_LOG (e.g. BURROW_LOG=debug) to see engine logs on stderr."
)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Include hidden (dot-prefixed) entries
    #[arg(short = 'a', long, global = true)]
    hidden: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Sort key
        #[arg(short, long, default_value = "name")]
        sort: SortArg,

        /// Reverse the order (files first, largest/newest first)
        #[arg(short, long)]
        reverse: bool,

        /// Show size and modification time
        #[arg(short, long)]
        long: bool,
    },

    /// Search names under a directory (case-insensitive substring)
    Search {
        root: PathBuf,
        query: String,
    },

    /// Show storage totals per category
    Analyze {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show usage of the volume containing PATH
    Df {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Classify a single path
    Stat { path: PathBuf },

    /// Copy sources into a destination directory
    Cp {
        /// Sources followed by the destination directory
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,

        /// What to do when a target already exists
        #[arg(long, default_value = "skip")]
        on_conflict: ConflictPolicy,
    },

    /// Move sources into a destination directory
    Mv {
        /// Sources followed by the destination directory
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,

        /// What to do when a target already exists
        #[arg(long, default_value = "skip")]
        on_conflict: ConflictPolicy,
    },

    /// Delete files and directories (recursively)
    Rm {
        #[arg(required = true)]
        targets: Vec<PathBuf>,
    },

    /// Compress sources into one zip archive
    Zip {
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Archive to create
        #[arg(short, long)]
        output: PathBuf,

        /// Encrypt entries with AES-256
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Extract a zip archive
    Unzip {
        archive: PathBuf,

        /// Destination directory (defaults to the archive name without extension)
        destination: Option<PathBuf>,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Rename an entry within its directory
    Rename { path: PathBuf, new_name: String },

    /// Create a directory (and missing parents)
    Mkdir { path: PathBuf },

    /// Create an empty file
    Touch { path: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SortArg {
    #[default]
    Name,
    Size,
    Modified,
    Type,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Size => SortKey::Size,
            SortArg::Modified => SortKey::Modified,
            SortArg::Type => SortKey::Type,
        }
    }
}

/// Records accesses in the debug log.
struct LogObserver;

impl AccessObserver for LogObserver {
    fn on_access(&self, entry: &Entry) {
        debug!(path = %entry.path.display(), category = %entry.category, "accessed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init_logger();

    let cli = Cli::parse();
    let json = cli.json;
    let mut config = BrowseConfig::new(".");
    config.include_hidden = cli.hidden;
    let mut browser = Browser::new(config).with_observer(Arc::new(LogObserver));

    match cli.command {
        Command::Ls {
            path,
            sort,
            reverse,
            long,
        } => {
            let direction = if reverse {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            browser.config_mut().sort = SortOrder::new(sort.into(), direction);
            run_ls(&browser, path, long, json).await?;
        }
        Command::Search { root, query } => run_search(&browser, root, query, json).await?,
        Command::Analyze { path } => run_analyze(&browser, path, json).await?,
        Command::Df { path } => run_df(&browser, path, json).await?,
        Command::Stat { path } => {
            let entry = browser.touch(path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                print_entry(&entry, true);
            }
        }
        Command::Cp { paths, on_conflict } => {
            let (sources, destination) = split_destination(paths)?;
            let executor = executor_with(on_conflict);
            let request =
                OperationRequest::from_parts(OperationKind::Copy, sources, Some(destination), None)?;
            finish(run_batch(executor.execute(request)).await?, json)?;
        }
        Command::Mv { paths, on_conflict } => {
            let (sources, destination) = split_destination(paths)?;
            let executor = executor_with(on_conflict);
            let request =
                OperationRequest::from_parts(OperationKind::Move, sources, Some(destination), None)?;
            finish(run_batch(executor.execute(request)).await?, json)?;
        }
        Command::Rm { targets } => {
            let request = OperationRequest::from_parts(OperationKind::Delete, targets, None, None)?;
            finish(run_batch(OperationExecutor::new().execute(request)).await?, json)?;
        }
        Command::Zip {
            sources,
            output,
            password,
        } => {
            let request = OperationRequest::from_parts(
                OperationKind::Compress,
                sources,
                Some(output),
                password.map(Password::from),
            )?;
            finish(run_batch(OperationExecutor::new().execute(request)).await?, json)?;
        }
        Command::Unzip {
            archive,
            destination,
            password,
        } => {
            let destination = match destination {
                Some(destination) => destination,
                None => default_extract_dir(&archive)?,
            };
            let request = OperationRequest::from_parts(
                OperationKind::Extract,
                vec![archive],
                Some(destination),
                password.map(Password::from),
            )?;
            finish(run_batch(OperationExecutor::new().execute(request)).await?, json)?;
        }
        Command::Rename { path, new_name } => {
            let handle = OperationExecutor::new().rename(path, new_name);
            finish(run_batch(handle).await?, json)?;
        }
        Command::Mkdir { path } => {
            let handle = OperationExecutor::new().create_directory(path);
            finish(run_batch(handle).await?, json)?;
        }
        Command::Touch { path } => {
            let handle = OperationExecutor::new().create_file(path);
            finish(run_batch(handle).await?, json)?;
        }
    }

    Ok(())
}

async fn run_ls(browser: &Browser, path: PathBuf, long: bool, json: bool) -> Result<()> {
    if !path.is_dir() {
        bail!("{} is not a readable directory", path.display());
    }
    let entries = browser.list(path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        print_entry(entry, long);
    }
    Ok(())
}

async fn run_search(browser: &Browser, root: PathBuf, query: String, json: bool) -> Result<()> {
    eprintln!("Searching {}...", root.display());
    let hits = browser.search(root, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    for hit in &hits {
        println!("{}", hit.path.display());
    }
    eprintln!("{} match(es)", hits.len());
    Ok(())
}

async fn run_analyze(browser: &Browser, path: PathBuf, json: bool) -> Result<()> {
    eprintln!("Analyzing {}...", path.display());
    let totals = browser.aggregate(path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    let grand_total = totals.total();
    let max = totals.iter().map(|(_, bytes)| bytes).max().unwrap_or(0).max(1);
    println!();
    println!("{}", "─".repeat(60));
    println!(" Storage by category - {}", format_size(grand_total));
    println!("{}", "─".repeat(60));
    for (bucket, bytes) in totals.iter() {
        println!(
            "   {:<12} {:>12} {}",
            bucket.to_string(),
            format_size(bytes),
            make_bar(bytes as f64 / max as f64, 30)
        );
    }
    println!();
    Ok(())
}

async fn run_df(browser: &Browser, path: PathBuf, json: bool) -> Result<()> {
    let info = browser
        .storage(&path)
        .await
        .with_context(|| format!("Cannot query volume of {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!(
        "{}  used {} of {} ({}%), {} free",
        path.display(),
        format_size(info.used_space),
        format_size(info.total_space),
        info.used_percentage,
        format_size(info.free_space)
    );
    println!(
        "{} {}",
        make_bar(f64::from(info.used_percentage) / 100.0, 40),
        info.used_percentage
    );
    Ok(())
}

fn executor_with(policy: ConflictPolicy) -> OperationExecutor {
    OperationExecutor::with_config(ExecutorConfig {
        conflict_policy: policy,
        ..ExecutorConfig::default()
    })
}

/// Drive a batch to its outcome, rendering progress on stderr. Ctrl-C
/// cancels the batch; items already done stay done.
async fn run_batch(mut handle: OperationHandle) -> Result<Outcome> {
    let token = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            token.cancel();
        }
    });

    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            OperationEvent::Progress(progress) => render_progress(&progress),
            OperationEvent::Complete(done) => outcome = Some(done),
        }
    }
    interrupt.abort();
    eprintln!();

    outcome.ok_or_else(|| eyre!("{} ended without reporting an outcome", handle.kind()))
}

fn render_progress(progress: &ProgressEvent) {
    let current = progress
        .current
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut stderr = std::io::stderr().lock();
    let _ = if progress.is_indeterminate() {
        write!(stderr, "\r\x1b[2K{} {}", progress.label, truncate(&current, 40))
    } else {
        write!(
            stderr,
            "\r\x1b[2K{} {}/{} {:>3.0}% {} {}",
            progress.label,
            progress.completed,
            progress.total,
            progress.percentage(),
            format_size(progress.bytes_processed),
            truncate(&current, 40)
        )
    };
    let _ = stderr.flush();
}

/// Print the outcome; a batch with failures or a fatal error exits non-zero.
fn finish(outcome: Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        for error in &outcome.errors {
            eprintln!("  {}: {}", error.path.display(), error.message);
        }
        println!("{}", outcome.summary());
    }

    if outcome.is_success() || outcome.is_cancelled() {
        Ok(())
    } else {
        Err(eyre!("{}", outcome.summary()))
    }
}

fn split_destination(mut paths: Vec<PathBuf>) -> Result<(Vec<PathBuf>, PathBuf)> {
    let destination = paths
        .pop()
        .ok_or_else(|| eyre!("A destination directory is required"))?;
    Ok((paths, destination))
}

fn default_extract_dir(archive: &Path) -> Result<PathBuf> {
    let stem = archive
        .file_stem()
        .ok_or_else(|| eyre!("{} has no file name", archive.display()))?;
    let parent = archive.parent().unwrap_or(Path::new(""));
    Ok(parent.join(stem))
}

fn print_entry(entry: &Entry, long: bool) {
    let marker = if entry.is_dir { "/" } else { "" };
    if !long {
        println!("{}{}", entry.name, marker);
        return;
    }

    let modified: DateTime<Local> = entry.modified.into();
    println!(
        "{:<12} {:>10}  {}  {}{}",
        entry.category.to_string(),
        entry.formatted_size(),
        modified.format("%Y-%m-%d %H:%M"),
        entry.name,
        marker
    );
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
