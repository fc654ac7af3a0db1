// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for the Poison view engine.
//!
//! This module defines [`PoisonError`], the single error enum returned by
//! every fallible operation, and [`SourceContext`] for pointing at the
//! template line a directive error came from.
//!
//! # Error Categories
//!
//! - **Lookup errors**: the view file does not exist
//! - **Directive errors**: unbalanced or unreadable directives
//! - **Cache errors**: the compiled artifact could not be persisted
//! - **Runtime errors**: the artifact failed while executing
//! - **Routing errors**: `@url` named an unknown route
//!
//! # Nested Renders
//!
//! `@include` and `@endcontent` re-enter the engine from inside a running
//! artifact. Failures there cross the Lua boundary as external errors; the
//! `From<mlua::Error>` conversion unwraps them again so callers see the
//! original [`PoisonError`] of the innermost view.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Source context for directive errors.
///
/// Captures the lines around an error so the message can show the
/// offending directive with line numbers.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Lines of the snippet, paired with their 1-indexed line numbers.
    pub lines: Vec<(usize, String)>,
    /// The line number where the error occurred (1-indexed).
    pub error_line: usize,
}

impl SourceContext {
    /// Creates a source context from template text and an error line.
    ///
    /// Captures 2 lines before and after the error line.
    pub fn from_source(source: &str, line: usize) -> Self {
        let first = line.saturating_sub(2).max(1);
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.to_string()))
            .filter(|(n, _)| *n >= first && *n <= line + 2)
            .collect();

        Self {
            lines,
            error_line: line,
        }
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (number, line) in &self.lines {
            let marker = if *number == self.error_line { '>' } else { ' ' };
            writeln!(f, "{}{:4} | {}", marker, number, line)?;
        }
        Ok(())
    }
}

/// Helper struct for displaying optional source context.
pub struct OptSourceContextDisplay<'a>(pub &'a Option<SourceContext>);

impl fmt::Display for OptSourceContextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ctx) => write!(f, "\n{}", ctx),
            None => Ok(()),
        }
    }
}

/// Helper trait for formatting optional source context.
pub trait AsDisplay<'a> {
    /// Wraps self for Display formatting.
    fn as_display(&'a self) -> OptSourceContextDisplay<'a>;
}

impl<'a> AsDisplay<'a> for Option<SourceContext> {
    fn as_display(&'a self) -> OptSourceContextDisplay<'a> {
        OptSourceContextDisplay(self)
    }
}

/// The main error type for Poison operations.
///
/// Cloneable so that an error raised by a nested render can be recovered
/// intact after it has travelled through the Lua runtime.
#[derive(Error, Debug, Clone)]
pub enum PoisonError {
    /// The view's source file does not exist.
    #[error("View [{view}] not found.")]
    TemplateNotFound {
        /// The logical (dotted) view name.
        view: String,
    },

    /// A directive is unbalanced, misplaced or unreadable.
    #[error("Malformed directive in [{view}] at line {line}: {message}{}", source_context.as_display())]
    MalformedDirective {
        /// The view being compiled.
        view: String,
        /// Line of the offending directive (0 when unknown).
        line: usize,
        /// What went wrong.
        message: String,
        /// Lines around the directive.
        source_context: Option<SourceContext>,
    },

    /// The view contains a raw code block but raw code is disabled.
    #[error("Raw code block in [{view}] at line {line} is not allowed by this renderer")]
    RawCodeDisabled {
        /// The view being compiled.
        view: String,
        /// Line of the raw block.
        line: usize,
    },

    /// A compiled artifact could not be written to the cache directory.
    #[error("Failed to write compiled view to {}: {source}", path.display())]
    CacheWriteFailure {
        /// Artifact path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The storage layer failed to read, list or delete a path.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Rendered output could not be written to the caller's stream.
    #[error("Failed to write rendered output: {0}")]
    Output(Arc<std::io::Error>),

    /// The artifact raised an error while executing.
    #[error("Runtime error in [{view}]: {message}")]
    Runtime {
        /// The view whose artifact failed.
        view: String,
        /// The Lua error message, with line numbers mapped to the template.
        message: String,
    },

    /// Lua runtime failure outside of artifact execution.
    #[error("Lua error: {0}")]
    Lua(mlua::Error),

    /// `@url` referenced a route name nobody registered.
    #[error("No route matches this name {0}")]
    RouteNotFound(String),

    /// `@url` was used but the renderer has no URL resolver.
    #[error("No URL resolver configured for @url")]
    NoUrlResolver,

    /// Render parameters were not a map.
    #[error("Invalid render params: {0}")]
    InvalidParams(String),

    /// A global or param value could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl PoisonError {
    /// Builds a [`PoisonError::MalformedDirective`] with source context.
    pub fn malformed(view: &str, source: &str, line: usize, message: impl Into<String>) -> Self {
        PoisonError::MalformedDirective {
            view: view.to_string(),
            line,
            message: message.into(),
            source_context: (line > 0).then(|| SourceContext::from_source(source, line)),
        }
    }

    /// Wraps an I/O failure on `path`.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PoisonError::Storage {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

impl From<mlua::Error> for PoisonError {
    fn from(err: mlua::Error) -> Self {
        match nested_error(&err) {
            Some(inner) => inner.clone(),
            None => PoisonError::Lua(err),
        }
    }
}

/// Finds a [`PoisonError`] raised by a Rust callback inside `err`.
pub(crate) fn nested_error(err: &mlua::Error) -> Option<&PoisonError> {
    match err {
        mlua::Error::CallbackError { cause, .. } => nested_error(cause),
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<PoisonError>(),
        _ => None,
    }
}

/// Convenience type alias for Results with [`PoisonError`].
pub type Result<T> = std::result::Result<T, PoisonError>;
