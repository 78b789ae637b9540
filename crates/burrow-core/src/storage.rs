//! Storage usage figures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::category::StorageBucket;

/// Accumulated bytes per storage bucket.
///
/// Every bucket is always present, in display order, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    totals: IndexMap<StorageBucket, u64>,
}

impl Default for CategoryTotals {
    fn default() -> Self {
        Self {
            totals: StorageBucket::iter().map(|bucket| (bucket, 0)).collect(),
        }
    }
}

impl CategoryTotals {
    /// Create totals with every bucket at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes to a bucket.
    pub fn add(&mut self, bucket: StorageBucket, bytes: u64) {
        let total = self.totals.entry(bucket).or_insert(0);
        *total = total.saturating_add(bytes);
    }

    /// Bytes accounted to a bucket.
    pub fn get(&self, bucket: StorageBucket) -> u64 {
        self.totals.get(&bucket).copied().unwrap_or(0)
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.totals.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Iterate buckets in display order.
    pub fn iter(&self) -> impl Iterator<Item = (StorageBucket, u64)> + '_ {
        self.totals.iter().map(|(bucket, bytes)| (*bucket, *bytes))
    }

    /// Buckets with a non-zero total.
    pub fn non_empty(&self) -> impl Iterator<Item = (StorageBucket, u64)> + '_ {
        self.iter().filter(|(_, bytes)| *bytes > 0)
    }
}

/// Space usage of one storage volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub total_space: u64,
    pub free_space: u64,
    pub used_space: u64,
    /// `floor(used / total * 100)`, 0 when the total is 0.
    pub used_percentage: u8,
}

impl StorageInfo {
    /// Derive the used figures from a volume's total and free bytes.
    pub fn from_space(total_space: u64, free_space: u64) -> Self {
        let used_space = total_space.saturating_sub(free_space);
        let used_percentage = if total_space == 0 {
            0
        } else {
            (u128::from(used_space) * 100 / u128::from(total_space)).min(100) as u8
        };

        Self {
            total_space,
            free_space,
            used_space,
            used_percentage,
        }
    }
}
