// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The Poison renderer.
//!
//! This module provides [`Renderer`], the public entry point of the engine:
//! it resolves views, compiles them to Lua, persists the artifacts and runs
//! them with the caller's params.
//!
//! # Quick Start
//!
//! ```rust
//! use poison::{MemoryStorage, Renderer, ViewConfig};
//! use serde_json::json;
//!
//! let config = ViewConfig::default().with_views_root("views").with_cache_root("cache");
//! let storage = MemoryStorage::new();
//! storage.add_view("views", "hello", ".poison.html", "<h1>Hello, {{ name }}!</h1>");
//!
//! let renderer = Renderer::new(config, storage)?;
//! let html = renderer.render("hello", json!({ "name": "World" }))?;
//! assert_eq!(html, "<h1>Hello, World!</h1>");
//! # Ok::<(), poison::PoisonError>(())
//! ```
//!
//! # Architecture
//!
//! - **Storage**: reads view sources, writes and flushes artifacts
//! - **Compiler**: scan, parse, translate, persist, execute
//! - **Runtime table**: Lua callbacks that re-enter the compiler for
//!   `@include`, `@extend` and `@url`
//!
//! # Thread Safety
//!
//! Each renderer owns one Lua state. Configuration, globals and the URL
//! resolver sit behind `RwLock`s in state shared with the Lua callbacks.
//! With the default `send` feature a renderer can be moved across threads.

use crate::cache::CacheManager;
use crate::compiler::TemplateCompiler;
use crate::config::ViewConfig;
use crate::context::{install_runtime, json_to_lua};
use crate::error::{PoisonError, Result};
use crate::globals::GlobalStore;
use crate::router::UrlResolver;
use crate::storage::{FileSystemStorage, Storage};
use mlua::{Lua, Table, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// View name used for [`Renderer::render_source`].
pub const INLINE_VIEW: &str = "<inline>";

/// Engine state shared between the renderer and its Lua callbacks.
#[derive(Debug)]
pub(crate) struct Shared {
    config: RwLock<ViewConfig>,
    storage: Box<dyn Storage>,
    globals: RwLock<GlobalStore>,
    urls: RwLock<Option<Arc<dyn UrlResolver>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Shared {
    pub(crate) fn config(&self) -> ViewConfig {
        read(&self.config).clone()
    }

    pub(crate) fn cache(&self) -> CacheManager {
        let config = read(&self.config);
        CacheManager::new(config.cache_root.clone(), config.cache_limit)
    }

    pub(crate) fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub(crate) fn globals(&self) -> RwLockReadGuard<'_, GlobalStore> {
        read(&self.globals)
    }

    pub(crate) fn url_resolver(&self) -> Option<Arc<dyn UrlResolver>> {
        read(&self.urls).clone()
    }
}

/// Renders Poison views.
///
/// A renderer is self-contained: its configuration and globals are never
/// shared with other renderers, so several can run side by side with
/// different view roots.
///
/// # Example
///
/// ```rust
/// use poison::{MemoryStorage, NamedRoutes, Renderer, ViewConfig};
///
/// let storage = MemoryStorage::new();
/// storage.add_view("views", "nav", ".poison.html", "<a href=\"@url('home')\">{{ app }}</a>");
///
/// let renderer = Renderer::new(ViewConfig::default().with_views_root("views"), storage)?;
/// renderer.add_global("app", "Poison")?;
/// renderer.set_url_resolver(NamedRoutes::new().with("home", "/"));
///
/// assert_eq!(renderer.render("nav", ())?, "<a href=\"/\">Poison</a>");
/// # Ok::<(), poison::PoisonError>(())
/// ```
#[derive(Debug)]
pub struct Renderer {
    lua: Lua,
    shared: Arc<Shared>,
}

impl Renderer {
    /// Sandboxes the Lua environment by disabling dangerous functions and libraries.
    ///
    /// This removes access to:
    /// - `io` library (file I/O)
    /// - `debug` library (introspection)
    /// - `load`, `loadstring`, `loadfile`, `dofile` (dynamic code execution)
    /// - `require` and `package` (module loading from disk)
    /// - Most of `os` library (keeps only `os.date`, `os.time`, `os.clock`, `os.difftime`)
    fn sandbox_lua(lua: &Lua, globals: &Table) -> Result<()> {
        let os_table: Table = globals.get("os")?;
        let os_date: mlua::Function = os_table.get("date")?;
        let os_time: mlua::Function = os_table.get("time")?;
        let os_clock: mlua::Function = os_table.get("clock")?;
        let os_difftime: mlua::Function = os_table.get("difftime")?;

        globals.set("io", Value::Nil)?;
        globals.set("debug", Value::Nil)?;

        globals.set("load", Value::Nil)?;
        globals.set("loadstring", Value::Nil)?;
        globals.set("loadfile", Value::Nil)?;
        globals.set("dofile", Value::Nil)?;
        globals.set("require", Value::Nil)?;
        globals.set("package", Value::Nil)?;

        let safe_os = lua.create_table()?;
        safe_os.set("date", os_date)?;
        safe_os.set("time", os_time)?;
        safe_os.set("clock", os_clock)?;
        safe_os.set("difftime", os_difftime)?;
        globals.set("os", safe_os)?;

        Ok(())
    }

    /// Creates a renderer over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Lua runtime fails to initialize.
    pub fn new<S: Storage>(config: ViewConfig, storage: S) -> Result<Self> {
        let lua = Lua::new();
        Self::sandbox_lua(&lua, &lua.globals())?;

        let shared = Arc::new(Shared {
            config: RwLock::new(config),
            storage: Box::new(storage),
            globals: RwLock::new(GlobalStore::new()),
            urls: RwLock::new(None),
        });
        install_runtime(&lua, Arc::clone(&shared))?;

        Ok(Self { lua, shared })
    }

    /// Creates a renderer that reads and writes the real filesystem.
    pub fn with_filesystem(config: ViewConfig) -> Result<Self> {
        Self::new(config, FileSystemStorage::new())
    }

    fn compiler(&self) -> TemplateCompiler<'_> {
        TemplateCompiler::new(&self.lua, &self.shared)
    }

    /// Converts caller params into a Lua table.
    ///
    /// `()`, `None` and JSON `null` mean "no params"; anything else must
    /// serialize to a map.
    fn params_table<P: Serialize>(&self, params: P) -> Result<Option<Table>> {
        let value =
            serde_json::to_value(params).map_err(|e| PoisonError::Serialize(e.to_string()))?;

        match value {
            JsonValue::Null => Ok(None),
            JsonValue::Object(_) => match json_to_lua(&self.lua, &value)? {
                Value::Table(table) => Ok(Some(table)),
                other => Err(PoisonError::InvalidParams(format!(
                    "params converted to {}",
                    other.type_name()
                ))),
            },
            other => Err(PoisonError::InvalidParams(format!(
                "params must be a map, got {}",
                other
            ))),
        }
    }

    /// Renders a view and returns its output.
    ///
    /// Flushes the artifact cache first if it has reached its limit.
    ///
    /// # Errors
    ///
    /// - [`PoisonError::TemplateNotFound`] if the view file does not exist
    /// - [`PoisonError::MalformedDirective`] for unbalanced or invalid directives
    /// - [`PoisonError::CacheWriteFailure`] if the artifact cannot be persisted
    /// - [`PoisonError::Runtime`] if the artifact fails while executing
    pub fn render<P: Serialize>(&self, view: &str, params: P) -> Result<String> {
        tracing::debug!("rendering {}", view);
        let params = self.params_table(params)?;
        self.compiler().render_view(view, params)
    }

    /// Renders a view into `out`.
    ///
    /// Nothing is written unless the whole render succeeds.
    pub fn render_to<P: Serialize, W: Write>(&self, view: &str, params: P, out: &mut W) -> Result<()> {
        let output = self.render(view, params)?;
        out.write_all(output.as_bytes())
            .map_err(|e| PoisonError::Output(Arc::new(e)))
    }

    /// Renders a view without applying the cache limit.
    ///
    /// This is what `@include` does. The view sees the globals and its own
    /// params only.
    pub fn include<P: Serialize>(&self, view: &str, params: P) -> Result<String> {
        let params = self.params_table(params)?;
        self.compiler().include_view(view, params)
    }

    /// Compiles and runs a template body that has no view file.
    pub fn render_source<P: Serialize>(&self, source: &str, params: P) -> Result<String> {
        let params = self.params_table(params)?;
        self.shared.cache().maybe_evict(self.shared.storage())?;
        self.compiler().compile(INLINE_VIEW, source, params)
    }

    /// Returns the Lua a view compiles to, or `None` if it has no directives.
    ///
    /// Nothing is written to the cache and nothing is executed.
    pub fn artifact_source(&self, view: &str) -> Result<Option<String>> {
        let compiler = self.compiler();
        let source = compiler.load_view(view)?;
        Ok(compiler.translate(view, &source)?.map(|artifact| artifact.code))
    }

    /// Adds or replaces a value visible to every later render.
    pub fn add_global<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<&Self> {
        write(&self.shared.globals).insert(key, value)?;
        Ok(self)
    }

    /// A snapshot of the registered globals.
    pub fn globals(&self) -> GlobalStore {
        self.shared.globals().clone()
    }

    /// Deletes every compiled artifact and returns how many were removed.
    pub fn clear_cache(&self) -> Result<usize> {
        let removed = self.shared.cache().clear(self.shared.storage())?;
        tracing::info!("cleared {} compiled views", removed);
        Ok(removed)
    }

    /// The current configuration.
    pub fn config(&self) -> ViewConfig {
        self.shared.config()
    }

    /// Changes where view sources are read from.
    pub fn set_views_root<P: Into<PathBuf>>(&self, path: P) {
        write(&self.shared.config).views_root = path.into();
    }

    /// Changes where artifacts are written.
    pub fn set_cache_root<P: Into<PathBuf>>(&self, path: P) {
        write(&self.shared.config).cache_root = path.into();
    }

    /// Changes the view file extension.
    pub fn set_extension(&self, extension: impl Into<String>) {
        write(&self.shared.config).extension = extension.into();
    }

    /// Changes the entry count at which the cache is flushed.
    pub fn set_cache_limit(&self, limit: usize) {
        write(&self.shared.config).cache_limit = limit;
    }

    /// Installs the resolver used by `@url`.
    pub fn set_url_resolver<R: UrlResolver>(&self, resolver: R) {
        *write(&self.shared.urls) = Some(Arc::new(resolver));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemoryStorage;
    use serde_json::json;

    fn renderer() -> (Renderer, MemoryStorage) {
        let storage = MemoryStorage::new();
        let config = ViewConfig::default()
            .with_views_root("views")
            .with_cache_root("cache");
        (Renderer::new(config, storage.clone()).unwrap(), storage)
    }

    #[test]
    fn test_sandbox_removes_io() {
        let (renderer, _) = renderer();
        let out = renderer
            .render_source("{{ tostring(io) }} {{ tostring(load) }} {{ type(os.time) }}", ())
            .unwrap();
        assert_eq!(out, "nil nil function");
    }

    #[test]
    fn test_sandbox_blocks_module_loading() {
        let (renderer, _) = renderer();
        let out = renderer
            .render_source("{{ tostring(require) }} {{ tostring(package) }}", ())
            .unwrap();
        assert_eq!(out, "nil nil");

        let err = renderer
            .render_source(
                "{{ (function() package.path = '/tmp/?.lua'; return require('evil') end)() }}",
                (),
            )
            .unwrap_err();
        assert!(matches!(err, PoisonError::Runtime { .. }));
    }

    #[test]
    fn test_params_must_be_a_map() {
        let (renderer, _) = renderer();
        let err = renderer.render_source("{{ 1 }}", json!([1, 2])).unwrap_err();
        assert!(matches!(err, PoisonError::InvalidParams(_)));

        assert_eq!(renderer.render_source("{{ 1 }}", None::<JsonValue>).unwrap(), "1");
    }

    #[test]
    fn test_setters_update_config() {
        let (renderer, storage) = renderer();
        storage.add_file("other/page.tpl", "{{ 'other' }}");

        renderer.set_views_root("other");
        renderer.set_extension(".tpl");
        renderer.set_cache_limit(3);
        renderer.set_cache_root("artifacts");

        assert_eq!(renderer.render("page", ()).unwrap(), "other");
        assert_eq!(renderer.config().cache_limit, 3);
        assert_eq!(storage.count_in(std::path::Path::new("artifacts")), 1);
    }

    #[test]
    fn test_add_global_chains() {
        let (renderer, _) = renderer();
        renderer
            .add_global("a", 1)
            .unwrap()
            .add_global("b", "two")
            .unwrap();
        assert_eq!(renderer.globals().len(), 2);
        assert_eq!(renderer.render_source("{{ a }}-{{ b }}", ()).unwrap(), "1-two");
    }

    #[cfg(feature = "send")]
    #[test]
    fn test_renderer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Renderer>();
    }
}
