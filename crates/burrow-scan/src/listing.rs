//! Immediate-children listing.

use std::fs;
use std::path::Path;

use burrow_core::{sort_entries, Entry, FsError, SortOrder};
use tracing::debug;

/// Read and classify every immediate child of `dir`, unfiltered and unsorted.
///
/// Individual children that vanish mid-listing are dropped; failing to open
/// the directory itself is an error.
pub fn read_children(dir: &Path) -> Result<Vec<Entry>, FsError> {
    let entries = fs::read_dir(dir).map_err(|e| FsError::io(dir, e))?;

    let mut children = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => children.push(Entry::classify(entry.path())),
            Err(err) => debug!(dir = %dir.display(), error = %err, "skipping unreadable child"),
        }
    }

    Ok(children)
}

/// List the immediate children of `dir`: directories first, then files, each
/// group ordered by case-insensitive name.
///
/// Returns an empty listing when the directory cannot be read.
pub fn list(dir: &Path, include_hidden: bool) -> Vec<Entry> {
    list_sorted(dir, include_hidden, SortOrder::default())
}

/// [`list`] with an explicit order.
pub fn list_sorted(dir: &Path, include_hidden: bool, order: SortOrder) -> Vec<Entry> {
    let mut entries = match read_children(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(error = %err, "directory listing failed");
            return Vec::new();
        }
    };

    if !include_hidden {
        entries.retain(|entry| !entry.hidden);
    }
    sort_entries(&mut entries, order);
    entries
}
