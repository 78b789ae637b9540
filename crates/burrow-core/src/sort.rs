//! Ordering of entry listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Type,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A complete listing order.
///
/// Ascending puts directories before files and orders each group by the key.
/// Descending reverses the whole comparison, so files come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Compare two entries under this order.
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        // Directories first: `!is_dir` is false for directories.
        let ordering = (!a.is_dir)
            .cmp(&!b.is_dir)
            .then_with(|| self.compare_key(a, b));

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    fn compare_key(&self, a: &Entry, b: &Entry) -> Ordering {
        match self.key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Modified => a.modified.cmp(&b.modified),
            SortKey::Type => a.extension.cmp(&b.extension),
        }
    }
}

/// Sort entries in place. The sort is stable.
pub fn sort_entries(entries: &mut [Entry], order: SortOrder) {
    entries.sort_by(|a, b| order.compare(a, b));
}
