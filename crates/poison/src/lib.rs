// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]
#![allow(clippy::result_large_err)]

//! # Poison
//!
//! A directive-based view engine that compiles templates to Lua.
//!
//! Views are plain text files (HTML, usually) with a small set of
//! directives. Each render scans the view, translates it into a Lua chunk,
//! writes that chunk to a cache directory and executes it with the caller's
//! params.
//!
//! ## Features
//!
//! - `{{ expr }}` interpolation with Lua expressions
//! - `@if`/`@elseif`/`@else`/`@endif` and `@foreach`/`@endforeach`
//! - Layouts with `@extend(...)` and `@content ... @endcontent`
//! - Partials with `@include(...)` and named routes with `@url(...)`
//! - Globals shared by every render of one renderer
//! - Raw Lua blocks (`{? ?}`, `{@ @}`, `{! !}`) in a sandbox, optional
//!
//! ## Quick Start
//!
//! ```rust
//! use poison::{MemoryStorage, Renderer, ViewConfig};
//! use serde_json::json;
//!
//! let storage = MemoryStorage::new();
//! storage.add_view("views", "layout", ".poison.html", "<title>{{ title }}</title>{{ content }}");
//! storage.add_view(
//!     "views",
//!     "home",
//!     ".poison.html",
//!     "@extend('layout', { title = page })@content<p>Hi</p>@endcontent",
//! );
//!
//! let renderer = Renderer::new(ViewConfig::default().with_views_root("views"), storage)?;
//! let html = renderer.render("home", json!({ "page": "Home" }))?;
//! assert_eq!(html, "<title>Home</title><p>Hi</p>");
//! # Ok::<(), poison::PoisonError>(())
//! ```

/// Node tree types.
pub mod ast;
/// Compiled artifact cache.
pub mod cache;
/// Lua code generation.
pub mod codegen;
/// Template compilation pipeline.
pub mod compiler;
/// Renderer configuration.
pub mod config;
/// Render environment and runtime table.
pub mod context;
/// Main renderer.
pub mod engine;
/// Error types and reporting.
pub mod error;
/// Per-renderer global values.
pub mod globals;
/// In-memory storage for tests and embedding.
pub mod memory_storage;
/// Directive parser.
pub mod parser;
/// URL generation for `@url`.
pub mod router;
/// Directive scanner.
pub mod scanner;
/// File access for sources and artifacts.
pub mod storage;

pub use ast::*;
pub use cache::*;
pub use codegen::*;
pub use compiler::*;
pub use config::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use globals::*;
pub use memory_storage::*;
pub use parser::*;
pub use router::*;
pub use scanner::*;
pub use storage::*;
