//! Case-insensitive substring search over a directory tree.

use std::ops::ControlFlow;
use std::path::Path;

use burrow_core::Entry;
use tokio_util::sync::CancellationToken;

use crate::walk::{walk, Visitor, WalkNode, WalkOptions};

/// Find every descendant of `root` whose name contains `query`, ignoring case.
///
/// Matching directories are reported and still descended into. An empty
/// query matches every descendant. Unreadable subtrees are skipped.
pub fn search(root: &Path, query: &str, include_hidden: bool) -> Vec<Entry> {
    search_cancellable(
        root,
        query,
        WalkOptions::new(include_hidden),
        &CancellationToken::new(),
    )
}

/// [`search`] with explicit walk options and a cancellation token.
///
/// On cancellation the hits found so far are returned.
pub fn search_cancellable(
    root: &Path,
    query: &str,
    options: WalkOptions,
    cancel: &CancellationToken,
) -> Vec<Entry> {
    let mut visitor = SearchVisitor {
        needle: query.to_lowercase(),
        hits: Vec::new(),
    };
    walk(root, options, cancel, &mut visitor);
    visitor.hits
}

struct SearchVisitor {
    needle: String,
    hits: Vec<Entry>,
}

impl Visitor for SearchVisitor {
    fn visit(&mut self, node: &WalkNode<'_>) -> ControlFlow<()> {
        if node.name().to_lowercase().contains(&self.needle) {
            self.hits.push(Entry::classify(node.path()));
        }
        ControlFlow::Continue(())
    }
}
