// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Compile command: shows the Lua a view translates to.

use crate::config::Config;
use console::style;
use std::io::Write;

/// Writes the artifact for `view` to `out`.
///
/// Views without directives have no artifact; a note goes to stderr instead.
pub fn run<W: Write>(config: &Config, view: &str, out: &mut W) -> anyhow::Result<()> {
    let renderer = config.renderer()?;

    match renderer.artifact_source(view)? {
        Some(code) => {
            out.write_all(code.as_bytes())?;
            out.flush()?;
        }
        None => {
            eprintln!(
                "{} {} has no directives and is served as-is",
                style("Passthrough:").yellow(),
                view
            );
        }
    }
    Ok(())
}
