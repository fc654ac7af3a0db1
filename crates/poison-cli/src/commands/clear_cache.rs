// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Clear-cache command.

use crate::config::Config;
use console::style;

/// Deletes every compiled artifact and returns how many were removed.
pub fn run(config: &Config) -> anyhow::Result<usize> {
    let renderer = config.renderer()?;
    let removed = renderer.clear_cache()?;

    println!(
        "{} {} compiled view(s) from {}",
        style("Removed").green(),
        removed,
        config.views.cache_root.display()
    );
    Ok(removed)
}
