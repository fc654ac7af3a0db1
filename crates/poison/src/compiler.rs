// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template compilation and execution.
//!
//! [`TemplateCompiler`] drives one template body through the whole pipeline:
//!
//! 1. **Scan**: [`scan`] finds the directive tags. A body without tags is
//!    returned as-is and nothing else happens.
//! 2. **Parse**: [`parse`] builds the node tree and rejects unbalanced blocks.
//! 3. **Translate**: [`generate_artifact`] emits the Lua chunk.
//! 4. **Persist**: the chunk is written to the cache directory under a
//!    fresh name.
//! 5. **Execute**: the chunk runs in a [`RenderContext`] and its captured
//!    output is returned.
//!
//! The compiler borrows the renderer's Lua state and shared state, so the
//! runtime callbacks can build one on the fly for nested views.

use crate::ast::Node;
use crate::codegen::{generate_artifact, Artifact};
use crate::context::{runtime_table, RenderContext};
use crate::engine::Shared;
use crate::error::{nested_error, PoisonError, Result};
use crate::parser::parse;
use crate::scanner::scan;
use crate::storage::view_path;

use mlua::{Lua, Table};

/// Compiles and executes template bodies against one Lua state.
pub struct TemplateCompiler<'a> {
    lua: &'a Lua,
    shared: &'a Shared,
}

impl<'a> TemplateCompiler<'a> {
    pub(crate) fn new(lua: &'a Lua, shared: &'a Shared) -> Self {
        Self { lua, shared }
    }

    /// Compiles `source` as `view` and executes it with `params`.
    ///
    /// Returns the source unchanged when it contains no directive.
    pub fn compile(&self, view: &str, source: &str, params: Option<Table>) -> Result<String> {
        let Some(artifact) = self.translate(view, source)? else {
            tracing::debug!("{} has no directives, passing through", view);
            return Ok(source.to_string());
        };

        let cache = self.shared.cache();
        cache.write_artifact(self.shared.storage(), &artifact.code)?;

        self.execute(&artifact, source, params)
    }

    /// Scans, parses and translates `source` without persisting or running it.
    ///
    /// `Ok(None)` means the body has no tags.
    pub fn translate(&self, view: &str, source: &str) -> Result<Option<Artifact>> {
        let tags = scan(source);
        if tags.is_empty() {
            return Ok(None);
        }
        tracing::debug!("scanned {} tags in {}", tags.len(), view);

        let nodes = parse(view, source, &tags)?;
        if !self.shared.config().raw_code {
            if let Some(line) = nodes.iter().find_map(Node::first_raw_line) {
                return Err(PoisonError::RawCodeDisabled {
                    view: view.to_string(),
                    line,
                });
            }
        }

        Ok(Some(generate_artifact(view, &nodes)))
    }

    /// Reads the source of a dotted view name.
    pub fn load_view(&self, view: &str) -> Result<String> {
        let config = self.shared.config();
        let path = view_path(&config.views_root, view, &config.extension);

        let bytes = self
            .shared
            .storage()
            .read(&path)?
            .ok_or_else(|| PoisonError::TemplateNotFound {
                view: view.to_string(),
            })?;

        String::from_utf8(bytes).map_err(|e| {
            PoisonError::storage(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Loads and compiles a view without touching the cache limit.
    pub fn include_view(&self, view: &str, params: Option<Table>) -> Result<String> {
        let source = self.load_view(view)?;
        self.compile(view, &source, params)
    }

    /// Applies the cache limit, then loads and compiles a view.
    pub fn render_view(&self, view: &str, params: Option<Table>) -> Result<String> {
        self.shared.cache().maybe_evict(self.shared.storage())?;
        self.include_view(view, params)
    }

    fn execute(&self, artifact: &Artifact, source: &str, params: Option<Table>) -> Result<String> {
        let context = {
            let globals = self.shared.globals();
            RenderContext::new(self.lua, &globals, params.as_ref())?
        };
        let runtime = runtime_table(self.lua)?;

        let function = self
            .lua
            .load(artifact.code.as_str())
            .set_name(format!("@{}", artifact.view))
            .set_environment(context.into_env())
            .into_function()
            .map_err(|err| syntax_error(artifact, source, err))?;

        function.call::<String>(runtime).map_err(|err| {
            let err = runtime_error(artifact, err);
            tracing::warn!("{}", err);
            err
        })
    }
}

/// A chunk that fails to load means a directive argument is not valid Lua.
fn syntax_error(artifact: &Artifact, source: &str, err: mlua::Error) -> PoisonError {
    let message = match &err {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => return PoisonError::from(other.clone()),
    };
    let line = artifact.source_map.template_line(&message).unwrap_or(0);
    PoisonError::malformed(
        &artifact.view,
        source,
        line,
        artifact.source_map.translate_error(&message),
    )
}

fn runtime_error(artifact: &Artifact, err: mlua::Error) -> PoisonError {
    if let Some(inner) = nested_error(&err) {
        return inner.clone();
    }

    let message = match &err {
        mlua::Error::RuntimeError(message) => message.clone(),
        other => other.to_string(),
    };
    let first_line = message.lines().next().unwrap_or_default();

    PoisonError::Runtime {
        view: artifact.view.clone(),
        message: artifact.source_map.translate_error(first_line),
    }
}
