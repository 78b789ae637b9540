//! File and directory creation.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::ItemError;
use crate::rename::validate_filename;

/// Create an empty file, creating missing parent directories.
pub(crate) fn create_file(path: &Path) -> Result<u64, ItemError> {
    check_new_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ItemError::io(parent, e))?;
    }

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ItemError::io(path, e))?;
    Ok(0)
}

/// Create a directory and any missing parents.
pub(crate) fn create_directory(path: &Path) -> Result<u64, ItemError> {
    check_new_path(path)?;
    fs::create_dir_all(path).map_err(|e| ItemError::io(path, e))?;
    Ok(0)
}

fn check_new_path(path: &Path) -> Result<(), ItemError> {
    let name = path
        .file_name()
        .ok_or_else(|| ItemError::NoFileName(path.to_path_buf()))?;
    validate_filename(&name.to_string_lossy()).map_err(ItemError::InvalidName)?;

    if fs::symlink_metadata(path).is_ok() {
        return Err(ItemError::DestinationExists(path.to_path_buf()));
    }
    Ok(())
}
