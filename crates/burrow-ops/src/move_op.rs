//! Move operation: rename when possible, copy then delete across devices.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::batch::{item_fn, run_items};
use crate::conflict::{ensure_not_ancestor, resolve_target, ConflictPolicy};
use crate::copy::{copy_entry, discard_partial, prepare_destination};
use crate::delete::remove_path;
use crate::error::ItemError;
use crate::executor::ExecutorConfig;
use crate::operation::OperationKind;
use crate::progress::{OperationEvent, Outcome};

/// Move each source into `destination`, creating the directory if needed.
pub(crate) async fn run(
    sources: Vec<PathBuf>,
    destination: PathBuf,
    config: &ExecutorConfig,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    if let Err(reason) = prepare_destination(&destination) {
        return Outcome::fatal(OperationKind::Move, sources.len(), reason);
    }

    let policy = config.conflict_policy;
    let buffer_size = config.copy_buffer_size;
    let work = item_fn(move |source, cancel| {
        move_into(source, &destination, policy, buffer_size, cancel)
    });
    run_items(OperationKind::Move, sources, tx, cancel, work).await
}

/// Move one source to `destination_dir/base_name(source)`.
///
/// Returns the size of a moved file, or the bytes copied when a directory
/// had to be copied across devices. A same-device directory move reports 0.
fn move_into(
    source: &Path,
    destination_dir: &Path,
    policy: ConflictPolicy,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let name = source
        .file_name()
        .ok_or_else(|| ItemError::NoFileName(source.to_path_buf()))?;
    let metadata = fs::symlink_metadata(source).map_err(|e| ItemError::io(source, e))?;
    if metadata.is_dir() {
        ensure_not_ancestor(source, destination_dir)?;
    }

    let target = resolve_target(source, destination_dir.join(name), policy)?;

    match fs::rename(source, &target) {
        Ok(()) => Ok(if metadata.is_file() { metadata.len() } else { 0 }),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "cross-device move, copying");
            move_across_devices(source, &target, &metadata, buffer_size, cancel)
        }
        Err(err) => Err(ItemError::io(source, err)),
    }
}

fn move_across_devices(
    source: &Path,
    target: &Path,
    metadata: &fs::Metadata,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let bytes = match copy_entry(source, target, metadata, buffer_size, cancel) {
        Ok(bytes) => bytes,
        Err(err) => {
            discard_partial(target);
            return Err(err);
        }
    };

    // The copy is complete; a source that cannot be removed leaves both.
    remove_path(source)?;
    Ok(bytes)
}
