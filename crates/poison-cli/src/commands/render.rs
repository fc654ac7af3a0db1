// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Render command: prints a rendered view.

use crate::config::Config;
use anyhow::{anyhow, Context};
use serde_json::Value;
use std::io::Write;

/// Renders `view` with JSON `params` and extra `key=JSON` globals into `out`.
pub fn run<W: Write>(
    config: &Config,
    view: &str,
    params: Option<&str>,
    globals: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    let renderer = config.renderer()?;

    for assignment in globals {
        let (key, value) = parse_global(assignment)?;
        renderer.add_global(key, value)?;
    }

    let params: Value = match params {
        Some(text) => serde_json::from_str(text).context("--params is not valid JSON")?,
        None => Value::Null,
    };

    renderer
        .render_to(view, params, out)
        .with_context(|| format!("failed to render {}", view))?;
    out.flush()?;
    Ok(())
}

/// Splits `key=value`. The value is read as JSON, or kept as a plain string
/// when it isn't valid JSON.
pub fn parse_global(assignment: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{}`", assignment))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("empty global name in `{}`", assignment));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_global() {
        assert_eq!(parse_global("n=3").unwrap(), ("n".to_string(), json!(3)));
        assert_eq!(
            parse_global("user={\"name\":\"ada\"}").unwrap().1,
            json!({ "name": "ada" })
        );
        assert_eq!(parse_global("app=Blog").unwrap().1, json!("Blog"));
        assert!(parse_global("novalue").is_err());
        assert!(parse_global("=1").is_err());
    }
}
