//! Copy operation with chunked, cancellable file copies.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::batch::{item_fn, run_items};
use crate::conflict::{ensure_not_ancestor, resolve_target, ConflictPolicy};
use crate::delete::remove_path;
use crate::error::ItemError;
use crate::executor::ExecutorConfig;
use crate::operation::OperationKind;
use crate::progress::{OperationEvent, Outcome};

/// Copy each source into `destination`, creating the directory if needed.
pub(crate) async fn run(
    sources: Vec<PathBuf>,
    destination: PathBuf,
    config: &ExecutorConfig,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    if let Err(reason) = prepare_destination(&destination) {
        return Outcome::fatal(OperationKind::Copy, sources.len(), reason);
    }

    let policy = config.conflict_policy;
    let buffer_size = config.copy_buffer_size;
    let work = item_fn(move |source, cancel| {
        copy_into(source, &destination, policy, buffer_size, cancel)
    });
    run_items(OperationKind::Copy, sources, tx, cancel, work).await
}

/// Make sure `destination` is a directory, creating it when missing.
pub(crate) fn prepare_destination(destination: &Path) -> Result<(), String> {
    match fs::metadata(destination) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(format!("{} is not a directory", destination.display())),
        Err(_) => fs::create_dir_all(destination)
            .map_err(|e| format!("Failed to create destination {}: {e}", destination.display())),
    }
}

/// Copy one source to `destination_dir/base_name(source)`.
///
/// Anything written for a failed or cancelled item is removed again.
pub(crate) fn copy_into(
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

    match copy_entry(source, &target, &metadata, buffer_size, cancel) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            discard_partial(&target);
            Err(err)
        }
    }
}

/// Recursively copy `source` to `target`, which must not exist yet.
pub(crate) fn copy_entry(
    source: &Path,
    target: &Path,
    metadata: &Metadata,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        return copy_symlink(source, target, buffer_size, cancel);
    }

    if file_type.is_dir() {
        fs::create_dir(target).map_err(|e| ItemError::io(target, e))?;

        let mut children = fs::read_dir(source)
            .map_err(|e| ItemError::io(source, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ItemError::io(source, e))?;
        children.sort_by_key(|entry| entry.file_name());

        let mut total_bytes = 0u64;
        for child in children {
            if cancel.is_cancelled() {
                return Err(ItemError::Cancelled);
            }
            let child_path = child.path();
            let child_metadata =
                fs::symlink_metadata(&child_path).map_err(|e| ItemError::io(&child_path, e))?;
            total_bytes += copy_entry(
                &child_path,
                &target.join(child.file_name()),
                &child_metadata,
                buffer_size,
                cancel,
            )?;
        }

        fs::set_permissions(target, metadata.permissions())
            .map_err(|e| ItemError::io(target, e))?;
        return Ok(total_bytes);
    }

    copy_file(source, target, metadata, buffer_size, cancel)
}

/// Copy file contents in `buffer_size` chunks, checking the token between
/// chunks.
fn copy_file(
    source: &Path,
    target: &Path,
    metadata: &Metadata,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let mut reader = File::open(source).map_err(|e| ItemError::io(source, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| ItemError::io(target, e))?;

    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut copied = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(ItemError::Cancelled);
        }
        let read = reader
            .read(&mut buffer)
            .map_err(|e| ItemError::io(source, e))?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .map_err(|e| ItemError::io(target, e))?;
        copied += read as u64;
    }
    writer.flush().map_err(|e| ItemError::io(target, e))?;

    if let Ok(modified) = metadata.modified() {
        if let Err(err) = writer.set_modified(modified) {
            debug!(path = %target.display(), error = %err, "could not preserve mtime");
        }
    }
    fs::set_permissions(target, metadata.permissions()).map_err(|e| ItemError::io(target, e))?;

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(
    source: &Path,
    target: &Path,
    _buffer_size: usize,
    _cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let link = fs::read_link(source).map_err(|e| ItemError::io(source, e))?;
    std::os::unix::fs::symlink(&link, target).map_err(|e| ItemError::io(target, e))?;
    Ok(0)
}

#[cfg(not(unix))]
fn copy_symlink(
    source: &Path,
    target: &Path,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, ItemError> {
    let metadata = fs::metadata(source).map_err(|e| ItemError::io(source, e))?;
    copy_entry(source, target, &metadata, buffer_size, cancel)
}

/// Remove whatever a failed item left at `target`, logging what cannot be removed.
pub(crate) fn discard_partial(target: &Path) {
    if fs::symlink_metadata(target).is_err() {
        return;
    }
    if let Err(err) = remove_path(target) {
        debug!(path = %target.display(), error = %err, "could not remove partial copy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUF: usize = 4;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::Builder::new().prefix("burrow-copy").tempdir().unwrap()
    }

    #[test]
    fn test_copy_file_in_small_chunks() {
        let temp = temp_dir();
        let source = temp.path().join("data.bin");
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        let data: Vec<u8> = (0..=255).collect();
        fs::write(&source, &data).unwrap();

        let bytes = copy_into(&source, &dest, ConflictPolicy::Skip, BUF, &CancellationToken::new())
            .unwrap();

        assert_eq!(bytes, 256);
        assert_eq!(fs::read(dest.join("data.bin")).unwrap(), data);
        assert!(source.exists());
    }

    #[test]
    fn test_copy_directory_tree() {
        let temp = temp_dir();
        let source = temp.path().join("tree");
        fs::create_dir_all(source.join("a/b")).unwrap();
        fs::write(source.join("top.txt"), "top").unwrap();
        fs::write(source.join("a/b/deep.txt"), "deep!").unwrap();
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();

        let bytes =
            copy_into(&source, &dest, ConflictPolicy::Skip, BUF, &CancellationToken::new()).unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(fs::read_to_string(dest.join("tree/top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(dest.join("tree/a/b/deep.txt")).unwrap(), "deep!");
    }

    #[test]
    fn test_copy_into_own_subtree_fails() {
        let temp = temp_dir();
        let source = temp.path().join("tree");
        fs::create_dir_all(source.join("inner")).unwrap();

        let err = copy_into(
            &source,
            &source.join("inner"),
            ConflictPolicy::Skip,
            BUF,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ItemError::SourceIsAncestor(_)));
        assert!(!source.join("inner/tree").exists());
    }

    #[test]
    fn test_cancelled_copy_leaves_no_partial_file() {
        let temp = temp_dir();
        let source = temp.path().join("big.bin");
        fs::write(&source, vec![7u8; 64]).unwrap();
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = copy_into(&source, &dest, ConflictPolicy::Skip, BUF, &cancel).unwrap_err();

        assert!(matches!(err, ItemError::Cancelled));
        assert!(!dest.join("big.bin").exists());
    }

    #[test]
    fn test_copy_into_same_directory_auto_renames() {
        let temp = temp_dir();
        let source = temp.path().join("note.txt");
        fs::write(&source, "n").unwrap();

        copy_into(
            &source,
            temp.path(),
            ConflictPolicy::AutoRename,
            BUF,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("note (1).txt")).unwrap(), "n");

        let err = copy_into(
            &source,
            temp.path(),
            ConflictPolicy::Overwrite,
            BUF,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ItemError::SameFile(_)));
        assert!(source.exists());
    }

    #[test]
    fn test_prepare_destination() {
        let temp = temp_dir();
        let nested = temp.path().join("x/y");
        prepare_destination(&nested).unwrap();
        assert!(nested.is_dir());

        let file = temp.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(prepare_destination(&file).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_recreated() {
        let temp = temp_dir();
        let source = temp.path().join("tree");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("real.txt"), "r").unwrap();
        std::os::unix::fs::symlink("real.txt", source.join("link.txt")).unwrap();
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();

        copy_into(&source, &dest, ConflictPolicy::Skip, BUF, &CancellationToken::new()).unwrap();

        let link = dest.join("tree/link.txt");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("real.txt"));
    }
}
