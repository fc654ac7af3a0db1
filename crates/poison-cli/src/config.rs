// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Poison project configuration.
//!
//! Configuration is loaded from `poison.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [views]
//! views_root = "resources/views"
//! cache_root = "storage/framework/views"
//! extension = ".poison.html"
//! cache_limit = 8
//! raw_code = true
//!
//! [globals]
//! app_name = "Blog"
//! year = 2026
//!
//! [routes]
//! home = "/"
//! "posts.show" = "posts/:id"
//! ```
//!
//! Relative paths in `[views]` are resolved against the directory that
//! holds the configuration file.

use poison::{NamedRoutes, Renderer, ViewConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "poison.toml";

/// Main configuration structure loaded from `poison.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where views and compiled artifacts live.
    #[serde(default)]
    pub views: ViewConfig,
    /// Values registered as globals on every renderer.
    #[serde(default)]
    pub globals: BTreeMap<String, toml::Value>,
    /// Named route patterns for `@url`.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
}

impl Config {
    /// Loads `poison.toml` from the current directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads configuration from `path`.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("{} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        if let Some(base) = path.parent() {
            config.views.views_root = rebase(base, &config.views.views_root);
            config.views.cache_root = rebase(base, &config.views.cache_root);
        }
        Ok(config)
    }

    /// Builds a filesystem renderer with the configured globals and routes.
    pub fn renderer(&self) -> anyhow::Result<Renderer> {
        let renderer = Renderer::with_filesystem(self.views.clone())?;

        for (key, value) in &self.globals {
            renderer.add_global(key.as_str(), value)?;
        }

        if !self.routes.is_empty() {
            let mut routes = NamedRoutes::new();
            for (name, pattern) in &self.routes {
                routes.add(name.as_str(), pattern);
            }
            renderer.set_url_resolver(routes);
        }

        Ok(renderer)
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.views, ViewConfig::default());
        assert!(config.globals.is_empty());
    }

    #[test]
    fn test_sections_are_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[views]
views_root = "views"
cache_limit = 3

[globals]
app = "Blog"

[routes]
home = "/"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.views.views_root, dir.path().join("views"));
        assert_eq!(config.views.cache_limit, 3);
        assert_eq!(config.views.extension, ".poison.html");
        assert_eq!(config.globals.get("app"), Some(&toml::Value::from("Blog")));
        assert_eq!(config.routes.get("home").map(String::as_str), Some("/"));
    }
}
