//! Recursive walk shared by search and category analysis.
//!
//! Both walks follow the same policy: pre-order, sorted by name, unreadable
//! nodes are skipped and never abort the walk. Callers plug in a [`Visitor`].

use std::borrow::Cow;
use std::error::Error;
use std::fs::{FileType, Metadata};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use jwalk::{DirEntry, Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Options for a recursive walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Descend into and report dot-prefixed entries.
    pub include_hidden: bool,
    /// Follow symbolic links to directories.
    pub follow_symlinks: bool,
}

impl WalkOptions {
    pub fn new(include_hidden: bool) -> Self {
        Self {
            include_hidden,
            follow_symlinks: false,
        }
    }
}

/// A node reached by the walk. The root itself is never reported.
pub struct WalkNode<'a> {
    entry: &'a DirEntry<((), ())>,
}

impl WalkNode<'_> {
    pub fn path(&self) -> PathBuf {
        self.entry.path()
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.entry.file_name().to_string_lossy()
    }

    /// Depth below the root, starting at 1.
    pub fn depth(&self) -> usize {
        self.entry.depth()
    }

    pub fn file_type(&self) -> FileType {
        self.entry.file_type()
    }

    pub fn is_dir(&self) -> bool {
        self.entry.file_type().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.entry.file_type().is_file()
    }

    pub fn metadata(&self) -> Option<Metadata> {
        match self.entry.metadata() {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                debug!(path = %self.entry.path().display(), error = %err, "metadata unavailable");
                None
            }
        }
    }
}

/// Per-node callback for [`walk`].
pub trait Visitor {
    /// Called for every reachable node in pre-order.
    fn visit(&mut self, node: &WalkNode<'_>) -> ControlFlow<()>;

    /// Called when a node or directory listing cannot be read.
    ///
    /// The default policy skips the node and keeps walking.
    fn unreadable(&mut self, path: Option<&Path>, error: &dyn Error) -> ControlFlow<()> {
        debug!(path = ?path, error = %error, "skipping unreadable entry");
        ControlFlow::Continue(())
    }
}

/// What a walk did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Nodes handed to the visitor.
    pub visited: u64,
    /// Nodes or listings that could not be read.
    pub skipped: u64,
    /// The cancellation token fired before the walk finished.
    pub cancelled: bool,
    /// The visitor asked to stop.
    pub stopped: bool,
}

/// Walk the subtree under `root`, handing every node to `visitor`.
///
/// Never fails: a missing or unreadable root simply yields no nodes.
pub fn walk<V: Visitor + ?Sized>(
    root: &Path,
    options: WalkOptions,
    cancel: &CancellationToken,
    visitor: &mut V,
) -> WalkSummary {
    let walker = WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(!options.include_hidden)
        .follow_links(options.follow_symlinks)
        .sort(true)
        .min_depth(1);

    let mut summary = WalkSummary::default();

    for entry_result in walker {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let flow = match entry_result {
            Ok(entry) => {
                summary.visited += 1;
                visitor.visit(&WalkNode { entry: &entry })
            }
            Err(err) => {
                summary.skipped += 1;
                visitor.unreadable(err.path(), &err)
            }
        };

        if flow.is_break() {
            summary.stopped = true;
            break;
        }
    }

    summary
}
