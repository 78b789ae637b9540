//! Storage analysis by category.

use std::ops::ControlFlow;
use std::path::Path;

use burrow_core::{CategoryTotals, StorageBucket};
use tokio_util::sync::CancellationToken;

use crate::walk::{walk, Visitor, WalkNode, WalkOptions};

/// Sum the sizes of all regular files under `root` into storage buckets.
///
/// Hidden files count. Directories are descended but never bucketed, and
/// unreadable subtrees are skipped.
pub fn aggregate_by_category(root: &Path) -> CategoryTotals {
    aggregate_cancellable(root, WalkOptions::new(true), &CancellationToken::new())
}

/// [`aggregate_by_category`] with explicit walk options and a cancellation token.
///
/// On cancellation the totals accumulated so far are returned.
pub fn aggregate_cancellable(
    root: &Path,
    options: WalkOptions,
    cancel: &CancellationToken,
) -> CategoryTotals {
    let mut visitor = CategoryVisitor {
        totals: CategoryTotals::new(),
    };
    walk(root, options, cancel, &mut visitor);
    visitor.totals
}

struct CategoryVisitor {
    totals: CategoryTotals,
}

impl Visitor for CategoryVisitor {
    fn visit(&mut self, node: &WalkNode<'_>) -> ControlFlow<()> {
        if !node.is_file() {
            return ControlFlow::Continue(());
        }

        if let Some(metadata) = node.metadata() {
            let path = node.path();
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy())
                .unwrap_or_default();
            self.totals
                .add(StorageBucket::for_extension(&extension), metadata.len());
        }

        ControlFlow::Continue(())
    }
}
