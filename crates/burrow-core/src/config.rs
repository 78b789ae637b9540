//! Browsing configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::sort::SortOrder;

/// Configuration supplied by the presentation layer for browsing.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BrowseConfig {
    /// Directory browsing starts in.
    pub start_directory: PathBuf,

    /// Include hidden (dot-prefixed) entries.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Listing order.
    #[builder(default)]
    #[serde(default)]
    pub sort: SortOrder,

    /// Follow symbolic links during recursive walks.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl BrowseConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.start_directory {
            Some(ref dir) if dir.as_os_str().is_empty() => {
                Err("Start directory cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Start directory is required".to_string()),
        }
    }
}

impl BrowseConfig {
    /// Create a new browse config builder.
    pub fn builder() -> BrowseConfigBuilder {
        BrowseConfigBuilder::default()
    }

    /// Create a config with defaults for the given start directory.
    pub fn new(start_directory: impl Into<PathBuf>) -> Self {
        Self {
            start_directory: start_directory.into(),
            include_hidden: false,
            sort: SortOrder::default(),
            follow_symlinks: false,
        }
    }

    /// Check if an entry with this name should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
