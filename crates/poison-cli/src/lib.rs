// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]

//! Poison CLI library.
//!
//! Command-line access to the Poison view engine: render a view, inspect the
//! Lua it compiles to, or flush the artifact cache.
//!
//! # Usage
//!
//! ```bash
//! poison render pages.home --params '{"title": "Home"}'
//! poison render pages.home --global app='"Blog"'
//! poison compile pages.home
//! poison clear-cache
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `poison.toml` at the project root.

/// CLI commands (render, compile, clear-cache).
pub mod commands;
/// Project configuration from `poison.toml`.
pub mod config;
