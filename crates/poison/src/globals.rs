// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Values visible to every render of one renderer.

use crate::error::{PoisonError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Named values injected into every render.
///
/// Entries are only ever added or replaced; per-call params with the same
/// name shadow them for that call.
#[derive(Debug, Clone, Default)]
pub struct GlobalStore {
    values: BTreeMap<String, Value>,
}

impl GlobalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes `value` and stores it under `key`, replacing any previous value.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| PoisonError::Serialize(e.to_string()))?;
        self.values.insert(key.into(), value);
        Ok(())
    }

    /// Looks up a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_replace() {
        let mut store = GlobalStore::new();
        assert!(store.is_empty());

        store.insert("app", "Atom").unwrap();
        store.insert("user", json!({ "name": "ada" })).unwrap();
        store.insert("app", "Poison").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("app"), Some(&json!("Poison")));
        let keys: Vec<_> = store.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["app", "user"]);
    }
}
