// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `render`: Render a view and print its output
//! - `compile`: Print the Lua a view compiles to
//! - `clear-cache`: Delete every compiled artifact

/// Artifact cache cleanup command.
pub mod clear_cache;
/// Artifact inspection command.
pub mod compile;
/// View rendering command.
pub mod render;
