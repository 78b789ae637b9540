//! Async facade over the blocking traversal functions.

use std::path::PathBuf;
use std::sync::Arc;

use burrow_core::{BrowseConfig, CategoryTotals, Entry, FsError, StorageInfo};
use tokio_util::sync::CancellationToken;

use crate::categories::aggregate_cancellable;
use crate::listing::list_sorted;
use crate::observer::AccessObserver;
use crate::search::search_cancellable;
use crate::volume;
use crate::walk::WalkOptions;

/// Runs listing, search, analysis and volume queries on the blocking pool so
/// the calling task never stalls on filesystem I/O.
#[derive(Clone)]
pub struct Browser {
    config: BrowseConfig,
    observer: Option<Arc<dyn AccessObserver>>,
}

impl Browser {
    pub fn new(config: BrowseConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach an observer notified by [`Browser::touch`].
    pub fn with_observer(mut self, observer: Arc<dyn AccessObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &BrowseConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BrowseConfig {
        &mut self.config
    }

    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            include_hidden: self.config.include_hidden,
            follow_symlinks: self.config.follow_symlinks,
        }
    }

    /// List a directory with the configured filter and order.
    pub async fn list(&self, dir: impl Into<PathBuf>) -> Result<Vec<Entry>, FsError> {
        let dir = dir.into();
        let include_hidden = self.config.include_hidden;
        let order = self.config.sort;
        run_blocking(move || list_sorted(&dir, include_hidden, order)).await
    }

    /// List the configured start directory.
    pub async fn list_start(&self) -> Result<Vec<Entry>, FsError> {
        self.list(self.config.start_directory.clone()).await
    }

    /// Recursive name search under `root`.
    pub async fn search(
        &self,
        root: impl Into<PathBuf>,
        query: impl Into<String>,
    ) -> Result<Vec<Entry>, FsError> {
        self.search_cancellable(root, query, CancellationToken::new())
            .await
    }

    /// Recursive name search that stops early when `cancel` fires.
    pub async fn search_cancellable(
        &self,
        root: impl Into<PathBuf>,
        query: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<Vec<Entry>, FsError> {
        let root = root.into();
        let query = query.into();
        let options = self.walk_options();
        run_blocking(move || search_cancellable(&root, &query, options, &cancel)).await
    }

    /// Per-category storage totals under `root`. Hidden files always count.
    pub async fn aggregate(&self, root: impl Into<PathBuf>) -> Result<CategoryTotals, FsError> {
        let root = root.into();
        let options = WalkOptions {
            include_hidden: true,
            follow_symlinks: self.config.follow_symlinks,
        };
        run_blocking(move || aggregate_cancellable(&root, options, &CancellationToken::new()))
            .await
    }

    /// Space usage of the volume containing `volume_root`.
    pub async fn storage(&self, volume_root: impl Into<PathBuf>) -> Result<StorageInfo, FsError> {
        let volume_root = volume_root.into();
        run_blocking(move || volume::query(&volume_root)).await?
    }

    /// Classify `path` and report the access to the observer.
    pub async fn touch(&self, path: impl Into<PathBuf>) -> Result<Entry, FsError> {
        let path = path.into();
        let entry = run_blocking(move || Entry::classify(path)).await?;
        if let Some(observer) = &self.observer {
            observer.on_access(&entry);
        }
        Ok(entry)
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, FsError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FsError::TaskFailed {
            message: e.to_string(),
        })
}
