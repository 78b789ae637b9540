//! Volume-level space statistics.

use std::path::Path;

use burrow_core::{FsError, StorageInfo};

/// Query total and free space of the volume containing `volume_root`.
///
/// A single statfs-style call, independent of the tree size.
pub fn query(volume_root: &Path) -> Result<StorageInfo, FsError> {
    let total = fs2::total_space(volume_root).map_err(|e| FsError::io(volume_root, e))?;
    let free = fs2::free_space(volume_root).map_err(|e| FsError::io(volume_root, e))?;
    Ok(StorageInfo::from_space(total, free))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_current_volume() {
        let temp = tempfile::Builder::new().prefix("burrow-volume").tempdir().unwrap();
        let info = query(temp.path()).unwrap();
        assert!(info.used_percentage <= 100);
        assert!(info.free_space <= info.total_space || info.total_space == 0);
        assert_eq!(info.used_space, info.total_space.saturating_sub(info.free_space));
    }

    #[test]
    fn test_query_missing_path_fails() {
        let err = query(Path::new("/no/such/burrow/volume")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
