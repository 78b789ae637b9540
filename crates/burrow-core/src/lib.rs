//! Core types for burrow.
//!
//! This crate provides the data model shared by the traversal engine and the
//! operation executor: classified filesystem entries, the category table,
//! storage figures, sorting, and browsing configuration.

mod category;
mod config;
mod entry;
mod error;
mod format;
mod sort;
mod storage;

pub use category::{Category, StorageBucket};
pub use config::{BrowseConfig, BrowseConfigBuilder};
pub use entry::Entry;
pub use error::FsError;
pub use format::format_size;
pub use sort::{sort_entries, SortDirection, SortKey, SortOrder};
pub use storage::{CategoryTotals, StorageInfo};
