//! Rename operation and filename validation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ItemError;

/// Rename `source` within its parent directory.
///
/// Fails when the name is invalid or a different entry already has it.
pub(crate) fn rename_item(source: &Path, new_name: &str) -> Result<PathBuf, ItemError> {
    validate_filename(new_name).map_err(ItemError::InvalidName)?;
    fs::symlink_metadata(source).map_err(|e| ItemError::io(source, e))?;

    let parent = source.parent().unwrap_or(Path::new(""));
    let target = parent.join(new_name);

    if target != source && fs::symlink_metadata(&target).is_ok() {
        return Err(ItemError::DestinationExists(target));
    }

    fs::rename(source, &target).map_err(|e| ItemError::io(source, e))?;
    Ok(target)
}

/// Longest name accepted, in bytes.
const MAX_NAME_LEN: usize = 255;

#[cfg(target_os = "windows")]
const FORBIDDEN_CHARS: &[char] = &['/', '\0', '\\', ':', '*', '?', '"', '<', '>', '|'];
#[cfg(not(target_os = "windows"))]
const FORBIDDEN_CHARS: &[char] = &['/', '\0'];

#[cfg(target_os = "windows")]
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Check that `name` is usable as a single path component.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }
    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("Name is too long (max {MAX_NAME_LEN} bytes)"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("Name cannot contain {c:?}"));
    }
    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("Name cannot start or end with spaces".into());
    }
    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }

    #[cfg(target_os = "windows")]
    {
        let stem = name.split('.').next().unwrap_or("").to_uppercase();
        if RESERVED_STEMS.contains(&stem.as_str()) {
            return Err("Reserved filename".into());
        }
    }

    Ok(())
}
