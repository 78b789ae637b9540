//! Classified filesystem entries.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::format::format_size;

/// A snapshot of one filesystem node.
///
/// Size and directory-ness are read once at classification time and are not
/// kept in sync with the filesystem afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute path. Relative inputs are resolved against the working
    /// directory without touching the filesystem.
    pub path: PathBuf,
    /// Final path component.
    pub name: CompactString,
    /// Whether the node is a directory (symlinks are followed).
    pub is_dir: bool,
    /// Size in bytes, 0 for directories.
    pub size: u64,
    /// Last modification time, `UNIX_EPOCH` when unknown.
    pub modified: SystemTime,
    /// Lowercased extension without the dot, empty when absent.
    pub extension: CompactString,
    /// Semantic category.
    pub category: Category,
    /// Dot-prefixed names are hidden.
    pub hidden: bool,
    pub readable: bool,
    pub writable: bool,
    /// Selection state owned by the presentation layer.
    #[serde(default)]
    pub selected: bool,
}

impl Entry {
    /// Build an entry from already-known facts, without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>, is_dir: bool, size: u64, modified: SystemTime) -> Self {
        let path = make_absolute(path.into());
        let name: CompactString = path
            .file_name()
            .map(|n| n.to_string_lossy().into())
            .unwrap_or_else(|| path.to_string_lossy().into());
        let extension: CompactString = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase().into())
            .unwrap_or_default();
        let category = Category::classify(is_dir, &extension);
        let hidden = name.starts_with('.');

        Self {
            path,
            name,
            is_dir,
            size: if is_dir { 0 } else { size },
            modified,
            extension,
            category,
            hidden,
            readable: true,
            writable: true,
            selected: false,
        }
    }

    /// Classify a path by reading its metadata.
    ///
    /// Never fails: if metadata cannot be read (for example the path vanished
    /// mid-call), a best-effort entry with zeroed size and timestamp is
    /// returned, marked unreadable and unwritable.
    pub fn classify(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).or_else(|_| std::fs::symlink_metadata(path));

        match metadata {
            Ok(metadata) => Self::from_metadata(path, &metadata),
            Err(_) => {
                let mut entry = Self::new(path, false, 0, UNIX_EPOCH);
                entry.readable = false;
                entry.writable = false;
                entry
            }
        }
    }

    /// Build an entry from metadata that was already fetched.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &Metadata) -> Self {
        let mut entry = Self::new(
            path,
            metadata.is_dir(),
            metadata.len(),
            metadata.modified().unwrap_or(UNIX_EPOCH),
        );
        entry.readable = is_readable(metadata);
        entry.writable = !metadata.permissions().readonly();
        entry
    }

    /// Human-readable size; directories render as `--`.
    pub fn formatted_size(&self) -> String {
        if self.is_dir {
            "--".to_string()
        } else {
            format_size(self.size)
        }
    }

    /// Flip the selection flag.
    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }
}

/// `std::path::absolute`, keeping the given path when it cannot be resolved
/// (empty path, unreadable working directory).
fn make_absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(unix)]
fn is_readable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o444 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &Metadata) -> bool {
    true
}
