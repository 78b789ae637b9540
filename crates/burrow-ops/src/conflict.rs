//! Handling of destinations that already exist.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::delete::remove_path;
use crate::error::ItemError;

/// What to do when a copy or move target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the existing item alone and count this item as failed.
    #[default]
    Skip,
    /// Remove the existing item first.
    Overwrite,
    /// Pick a free name such as "file (1).txt".
    AutoRename,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::AutoRename => write!(f, "rename"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "rename" | "auto-rename" | "auto_rename" => Ok(Self::AutoRename),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected skip, overwrite or rename)"
            )),
        }
    }
}

/// Decide where `source` should land when its natural target is `target`.
///
/// Returns `target` itself when nothing is there. With
/// [`ConflictPolicy::Overwrite`] the existing item is removed before
/// returning, unless it is the source itself.
pub(crate) fn resolve_target(
    source: &Path,
    target: PathBuf,
    policy: ConflictPolicy,
) -> Result<PathBuf, ItemError> {
    if fs::symlink_metadata(&target).is_err() {
        return Ok(target);
    }

    match policy {
        ConflictPolicy::Skip => Err(ItemError::DestinationExists(target)),
        ConflictPolicy::AutoRename => Ok(auto_rename_path(&target)),
        ConflictPolicy::Overwrite => {
            if is_same_file(source, &target) {
                return Err(ItemError::SameFile(target));
            }
            remove_path(&target)?;
            Ok(target)
        }
    }
}

/// Fail when `destination_dir` is `source` or lies inside it.
pub(crate) fn ensure_not_ancestor(source: &Path, destination_dir: &Path) -> Result<(), ItemError> {
    let source = fs::canonicalize(source).map_err(|e| ItemError::io(source, e))?;
    let destination =
        fs::canonicalize(destination_dir).map_err(|e| ItemError::io(destination_dir, e))?;

    if destination.starts_with(&source) {
        Err(ItemError::SourceIsAncestor(source))
    } else {
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Generate an auto-renamed path to avoid conflicts.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let candidate = |suffix: &str| match &extension {
        Some(ext) => parent.join(format!("{stem} {suffix}.{ext}")),
        None => parent.join(format!("{stem} {suffix}")),
    };

    for i in 1..1000 {
        let new_path = candidate(&format!("({i})"));
        if fs::symlink_metadata(&new_path).is_err() {
            return new_path;
        }
    }

    // Fallback: use timestamp
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    candidate(&format!("({timestamp})"))
}
