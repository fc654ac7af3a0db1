// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Renderer configuration.
//!
//! Each [`Renderer`](crate::Renderer) owns a [`ViewConfig`]. The defaults
//! describe the conventional application layout; override them per
//! instance with the builder methods or the renderer's setters.
//!
//! # Example (TOML)
//!
//! ```toml
//! views_root = "resources/views"
//! cache_root = "storage/framework/views"
//! extension = ".poison.html"
//! cache_limit = 8
//! raw_code = true
//! ```

use crate::cache::DEFAULT_CACHE_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default view file extension, appended to the view path.
pub const DEFAULT_EXTENSION: &str = ".poison.html";

/// Where views are read from and compiled artifacts are written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Root directory of view sources (default: "resources/views").
    pub views_root: PathBuf,
    /// Directory for compiled artifacts (default: "storage/framework/views").
    pub cache_root: PathBuf,
    /// Suffix appended to view paths, including the dot (default: ".poison.html").
    pub extension: String,
    /// Entry count at which the cache directory is flushed (default: 8).
    pub cache_limit: usize,
    /// Whether `{? ?}`, `{@ @}` and `{! !}` raw code blocks are accepted (default: true).
    ///
    /// This only rejects the raw delimiters. Expressions are still Lua and
    /// can run any statement through a function literal; the sandbox is what
    /// limits what templates can reach.
    pub raw_code: bool,
}

fn default_views_root() -> PathBuf {
    Path::new("resources").join("views")
}

fn default_cache_root() -> PathBuf {
    Path::new("storage").join("framework").join("views")
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            views_root: default_views_root(),
            cache_root: default_cache_root(),
            extension: DEFAULT_EXTENSION.to_string(),
            cache_limit: DEFAULT_CACHE_LIMIT,
            raw_code: true,
        }
    }
}

impl ViewConfig {
    /// Default layout rooted at an application base directory.
    pub fn for_base<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            views_root: base.join(default_views_root()),
            cache_root: base.join(default_cache_root()),
            ..Self::default()
        }
    }

    /// Sets the views root.
    pub fn with_views_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.views_root = path.into();
        self
    }

    /// Sets the artifact directory.
    pub fn with_cache_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_root = path.into();
        self
    }

    /// Sets the view extension (e.g. `".tpl"`).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the flush threshold.
    pub fn with_cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit;
        self
    }

    /// Accepts or rejects raw code blocks.
    pub fn with_raw_code(mut self, allowed: bool) -> Self {
        self.raw_code = allowed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.views_root, Path::new("resources").join("views"));
        assert_eq!(config.extension, ".poison.html");
        assert_eq!(config.cache_limit, 8);
        assert!(config.raw_code);
    }

    #[test]
    fn test_for_base() {
        let config = ViewConfig::for_base("/srv/app");
        assert_eq!(
            config.cache_root,
            Path::new("/srv/app").join("storage").join("framework").join("views")
        );
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: ViewConfig =
            serde_json::from_str(r#"{ "views_root": "views", "raw_code": false }"#).unwrap();
        assert_eq!(config.views_root, PathBuf::from("views"));
        assert_eq!(config.extension, DEFAULT_EXTENSION);
        assert!(!config.raw_code);
    }
}
