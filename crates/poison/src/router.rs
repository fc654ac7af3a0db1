// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! URL generation for the `@url` directive.
//!
//! Routing itself lives outside the engine. Views only need one capability
//! from it: turn a route name plus parameters into a path. That capability
//! is the [`UrlResolver`] trait; [`NamedRoutes`] is a small table-backed
//! implementation for applications that don't bring their own router.
//!
//! - `posts.show` → `posts/:id` → `/posts/42`
//! - `home` → `` → `/`

use crate::error::{PoisonError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resolves a named route to a URL path.
#[cfg(feature = "send")]
pub trait UrlResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Builds the path for route `name` with `params` substituted.
    fn url(&self, name: &str, params: &Map<String, Value>) -> Result<String>;
}

/// Resolves a named route to a URL path (single-threaded variant).
#[cfg(not(feature = "send"))]
pub trait UrlResolver: std::fmt::Debug + 'static {
    /// Builds the path for route `name` with `params` substituted.
    fn url(&self, name: &str, params: &Map<String, Value>) -> Result<String>;
}

/// A table of named route patterns.
///
/// Patterns use `:name` placeholders, e.g. `users/:id/posts/:post`.
/// Leading and trailing slashes are ignored when registering.
#[derive(Debug, Clone, Default)]
pub struct NamedRoutes {
    routes: HashMap<String, String>,
}

impl NamedRoutes {
    /// Creates an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pattern` under `name`. The first registration of a name wins.
    pub fn add(&mut self, name: impl Into<String>, pattern: &str) -> &mut Self {
        self.routes
            .entry(name.into())
            .or_insert_with(|| pattern.trim_matches('/').to_string());
        self
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, name: impl Into<String>, pattern: &str) -> Self {
        self.add(name, pattern);
        self
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl UrlResolver for NamedRoutes {
    fn url(&self, name: &str, params: &Map<String, Value>) -> Result<String> {
        let pattern = self
            .routes
            .get(name)
            .ok_or_else(|| PoisonError::RouteNotFound(name.to_string()))?;

        // Longest keys first so `:id` never clobbers the start of `:identifier`.
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let mut path = pattern.clone();
        for key in keys {
            path = path.replace(&format!(":{}", key), &param_text(&params[key]));
        }

        Ok(format!("/{}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_url_substitutes_params() {
        let routes = NamedRoutes::new()
            .with("posts.show", "/posts/:id/")
            .with("home", "/");

        assert_eq!(
            routes.url("posts.show", &params(json!({ "id": 42 }))).unwrap(),
            "/posts/42"
        );
        assert_eq!(routes.url("home", &Map::new()).unwrap(), "/");
    }

    #[test]
    fn test_longer_keys_replace_first() {
        let routes = NamedRoutes::new().with("u", "users/:id/:identifier");
        let url = routes
            .url("u", &params(json!({ "id": "7", "identifier": "ada" })))
            .unwrap();
        assert_eq!(url, "/users/7/ada");
    }

    #[test]
    fn test_first_registration_wins() {
        let mut routes = NamedRoutes::new();
        routes.add("home", "first").add("home", "second");
        assert_eq!(routes.url("home", &Map::new()).unwrap(), "/first");
    }

    #[test]
    fn test_unknown_route() {
        let err = NamedRoutes::new().url("missing", &Map::new()).unwrap_err();
        assert!(matches!(err, PoisonError::RouteNotFound(name) if name == "missing"));
    }
}
