//! Delete operation.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::batch::{item_fn, run_items};
use crate::error::ItemError;
use crate::operation::OperationKind;
use crate::progress::{OperationEvent, Outcome};

/// Delete each target in order, recursively for directories.
pub(crate) async fn run(
    targets: Vec<PathBuf>,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    let work = item_fn(|target, _| delete_item(target));
    run_items(OperationKind::Delete, targets, tx, cancel, work).await
}

/// Remove one file, symlink or directory tree. Returns the bytes freed by
/// a single file, 0 for directories and links.
fn delete_item(target: &Path) -> Result<u64, ItemError> {
    let metadata = fs::symlink_metadata(target).map_err(|e| ItemError::io(target, e))?;
    let bytes = if metadata.is_file() { metadata.len() } else { 0 };
    remove_path(target)?;
    Ok(bytes)
}

/// Remove a path without following a final symlink.
pub(crate) fn remove_path(path: &Path) -> Result<(), ItemError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| ItemError::io(path, e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| ItemError::io(path, e))
}
