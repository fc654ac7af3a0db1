// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! What an artifact sees while it runs.
//!
//! Two tables are handed to every artifact:
//!
//! - The **environment** ([`RenderContext`]): global values, overridden by
//!   the call's params, falling back to the sandboxed Lua globals. Template
//!   expressions such as `{{ title }}` are resolved here.
//! - The **runtime table**: passed as the chunk's only argument and bound to
//!   the local `__rt`. It carries the output buffer factory, nil-tolerant
//!   iterators, and the engine callbacks `include`, `render` and `url` that
//!   re-enter the compiler for nested views.
//!
//! The runtime table is built once per renderer and kept in the Lua
//! registry.

use crate::compiler::TemplateCompiler;
use crate::engine::Shared;
use crate::error::{PoisonError, Result};
use crate::globals::GlobalStore;
use mlua::{DeserializeOptions, Lua, LuaSerdeExt, SerializeOptions, Table, Value};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

const RUNTIME_KEY: &str = "__poison_runtime";

/// Lua half of the runtime table.
const RUNTIME_HELPERS: &str = r#"
local runtime = {}

function runtime.output()
  local stack = { {} }

  local function write(value)
    if value == nil then
      return
    end
    local top = stack[#stack]
    top[#top + 1] = tostring(value)
  end

  local function capture()
    stack[#stack + 1] = {}
  end

  local function release()
    if #stack < 2 then
      error("@endcontent without a matching @content", 2)
    end
    return table.concat(table.remove(stack))
  end

  local function finish()
    return table.concat(stack[1])
  end

  return write, capture, release, finish
end

function runtime.ipairs(list)
  return ipairs(list or {})
end

function runtime.pairs(t)
  return pairs(t or {})
end

function runtime.fail(message)
  error(message, 2)
end

return runtime
"#;

/// Builds the runtime table and stores it in the registry.
pub(crate) fn install_runtime(lua: &Lua, shared: Arc<Shared>) -> Result<()> {
    let runtime: Table = lua
        .load(RUNTIME_HELPERS)
        .set_name("@poison_runtime")
        .eval()?;

    let state = Arc::clone(&shared);
    let include = lua.create_function(move |lua, (name, params): (String, Option<Table>)| {
        TemplateCompiler::new(lua, &state)
            .include_view(&name, params)
            .map_err(mlua::Error::external)
    })?;
    runtime.set("include", include)?;

    let state = Arc::clone(&shared);
    let render = lua.create_function(move |lua, (name, params): (String, Option<Table>)| {
        TemplateCompiler::new(lua, &state)
            .render_view(&name, params)
            .map_err(mlua::Error::external)
    })?;
    runtime.set("render", render)?;

    let state = shared;
    let url = lua.create_function(move |lua, (name, params): (String, Option<Table>)| {
        resolve_url(lua, &state, &name, params).map_err(mlua::Error::external)
    })?;
    runtime.set("url", url)?;

    lua.set_named_registry_value(RUNTIME_KEY, runtime)?;
    Ok(())
}

/// The runtime table installed by [`install_runtime`].
pub(crate) fn runtime_table(lua: &Lua) -> Result<Table> {
    Ok(lua.named_registry_value::<Table>(RUNTIME_KEY)?)
}

fn resolve_url(lua: &Lua, shared: &Shared, name: &str, params: Option<Table>) -> Result<String> {
    let resolver = shared.url_resolver().ok_or(PoisonError::NoUrlResolver)?;
    let params = match params {
        Some(table) => table_to_map(lua, table)?,
        None => Map::new(),
    };
    resolver.url(name, &params)
}

/// Converts a Lua params table into a JSON object.
pub(crate) fn table_to_map(lua: &Lua, table: Table) -> Result<Map<String, JsonValue>> {
    let options = DeserializeOptions::new().deny_unsupported_types(false);
    let value: JsonValue = lua
        .from_value_with(Value::Table(table), options)
        .map_err(|e| PoisonError::InvalidParams(e.to_string()))?;

    match value {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Array(items) if items.is_empty() => Ok(Map::new()),
        JsonValue::Null => Ok(Map::new()),
        other => Err(PoisonError::InvalidParams(format!(
            "expected a table of named values, got {}",
            other
        ))),
    }
}

/// Converts a JSON value into Lua with JSON null mapped to `nil`.
pub(crate) fn json_to_lua(lua: &Lua, value: &JsonValue) -> Result<Value> {
    let options = SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false);
    lua.to_value_with(value, options)
        .map_err(|e| PoisonError::Serialize(e.to_string()))
}

/// The environment table one artifact executes in.
///
/// Holds every global, then every param (params win), and defers all other
/// lookups to the sandboxed Lua globals through `__index`. Assignments made
/// by raw code land in this table and never leak into other renders.
#[derive(Debug, Clone)]
pub struct RenderContext {
    env: Table,
}

impl RenderContext {
    /// Builds the environment from `globals` and optional `params`.
    pub fn new(lua: &Lua, globals: &GlobalStore, params: Option<&Table>) -> Result<Self> {
        let env = lua.create_table()?;

        for (key, value) in globals.iter() {
            env.raw_set(key.as_str(), json_to_lua(lua, value)?)?;
        }

        if let Some(params) = params {
            for pair in params.clone().pairs::<Value, Value>() {
                let (key, value) = pair?;
                env.raw_set(key, value)?;
            }
        }

        let mt = lua.create_table()?;
        mt.set("__index", lua.globals())?;
        env.set_metatable(Some(mt));

        Ok(Self { env })
    }

    /// The environment table.
    pub fn env(&self) -> &Table {
        &self.env
    }

    /// Consumes the context, returning the environment table.
    pub fn into_env(self) -> Table {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_override_globals() {
        let lua = Lua::new();
        let mut globals = GlobalStore::new();
        globals.insert("title", "global").unwrap();
        globals.insert("app", "Poison").unwrap();

        let params = lua.create_table().unwrap();
        params.set("title", "local").unwrap();

        let ctx = RenderContext::new(&lua, &globals, Some(&params)).unwrap();
        assert_eq!(ctx.env().get::<String>("title").unwrap(), "local");
        assert_eq!(ctx.env().get::<String>("app").unwrap(), "Poison");
    }

    #[test]
    fn test_environment_falls_back_to_lua_globals() {
        let lua = Lua::new();
        let ctx = RenderContext::new(&lua, &GlobalStore::new(), None).unwrap();
        let result: String = lua
            .load("return string.upper('ok')")
            .set_environment(ctx.into_env())
            .eval()
            .unwrap();
        assert_eq!(result, "OK");
    }

    #[test]
    fn test_json_null_becomes_nil() {
        let lua = Lua::new();
        let mut globals = GlobalStore::new();
        globals.insert("user", json!({ "name": "ada", "email": null })).unwrap();

        let ctx = RenderContext::new(&lua, &globals, None).unwrap();
        let missing: bool = lua
            .load("return user.email == nil and user.name == 'ada'")
            .set_environment(ctx.into_env())
            .eval()
            .unwrap();
        assert!(missing);
    }

    #[test]
    fn test_output_buffer_stack() {
        let lua = Lua::new();
        let runtime: Table = lua.load(RUNTIME_HELPERS).eval().unwrap();
        let out: String = lua
            .load(
                r#"
                local rt = ...
                local write, capture, release, finish = rt.output()
                write("a")
                write(nil)
                capture()
                write("inner")
                local inner = release()
                write("[" .. inner .. "]")
                for _, v in rt.ipairs(nil) do write(v) end
                return finish()
            "#,
            )
            .call(runtime)
            .unwrap();
        assert_eq!(out, "a[inner]");
    }

    #[test]
    fn test_release_without_capture_fails() {
        let lua = Lua::new();
        let runtime: Table = lua.load(RUNTIME_HELPERS).eval().unwrap();
        let err = lua
            .load("local rt = ...; local _, _, release = rt.output(); release()")
            .call::<()>(runtime)
            .unwrap_err();
        assert!(err.to_string().contains("without a matching @content"));
    }

    #[test]
    fn test_table_to_map() {
        let lua = Lua::new();
        let table: Table = lua.load("return { id = 3, slug = 'intro' }").eval().unwrap();
        let map = table_to_map(&lua, table).unwrap();
        assert_eq!(map.get("id"), Some(&json!(3)));
        assert_eq!(map.get("slug"), Some(&json!("intro")));

        let empty: Table = lua.create_table().unwrap();
        assert!(table_to_map(&lua, empty).unwrap().is_empty());
    }
}
