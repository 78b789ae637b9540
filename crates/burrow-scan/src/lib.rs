//! Directory traversal and volume statistics for burrow.
//!
//! # Overview
//!
//! - [`list`] returns the immediate children of a directory, filtered and
//!   ordered, and never fails.
//! - [`search`] and [`aggregate_by_category`] share one recursive
//!   [`walk`] primitive: pre-order, skip-on-error, cancellable.
//! - [`query`] reads volume totals in a single call.
//! - [`Browser`] dispatches all of the above to the blocking pool.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use burrow_scan::{aggregate_by_category, list, search};
//!
//! let root = Path::new("/path/to/browse");
//! for entry in list(root, false) {
//!     println!("{} {}", entry.name, entry.formatted_size());
//! }
//!
//! let hits = search(root, "report", false);
//! println!("{} matches", hits.len());
//!
//! let totals = aggregate_by_category(root);
//! println!("{} bytes in total", totals.total());
//! ```

mod browser;
mod categories;
mod listing;
mod observer;
mod search;
mod volume;
mod walk;

pub use browser::Browser;
pub use categories::{aggregate_by_category, aggregate_cancellable};
pub use listing::{list, list_sorted, read_children};
pub use observer::{AccessObserver, ChannelObserver};
pub use search::{search, search_cancellable};
pub use volume::query;
pub use walk::{walk, Visitor, WalkNode, WalkOptions, WalkSummary};

// Re-export core types for convenience
pub use burrow_core::{
    BrowseConfig, Category, CategoryTotals, Entry, FsError, SortOrder, StorageBucket,
    StorageInfo,
};
