// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Compiled artifact cache.
//!
//! Every compile writes a fresh artifact under a unique name; artifacts are
//! never looked up again. The cache directory is kept small by a blunt
//! policy: once it holds [`DEFAULT_CACHE_LIMIT`] entries or more, the next
//! top-level render deletes all of them.

use crate::error::{PoisonError, Result};
use crate::storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Entry count at which the cache directory is flushed.
pub const DEFAULT_CACHE_LIMIT: usize = 8;

/// Bounds and fills the artifact directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    root: PathBuf,
    limit: usize,
}

impl CacheManager {
    /// Creates a manager for `root` that flushes at `limit` entries.
    pub fn new<P: Into<PathBuf>>(root: P, limit: usize) -> Self {
        Self {
            root: root.into(),
            limit,
        }
    }

    /// Deletes every artifact if the directory holds `limit` entries or more.
    ///
    /// Returns the number of entries deleted (0 when under the limit). An
    /// entry that cannot be deleted is logged and skipped.
    pub fn maybe_evict(&self, storage: &dyn Storage) -> Result<usize> {
        let entries = storage.list(&self.root)?;
        if entries.len() < self.limit {
            return Ok(0);
        }

        let deleted = delete_all(storage, &entries);
        tracing::info!(
            "flushed {} compiled views from {}",
            deleted,
            self.root.display()
        );
        Ok(deleted)
    }

    /// Deletes every artifact regardless of the limit.
    pub fn clear(&self, storage: &dyn Storage) -> Result<usize> {
        let entries = storage.list(&self.root)?;
        Ok(delete_all(storage, &entries))
    }

    /// Persists `code` under a freshly generated name and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`PoisonError::CacheWriteFailure`] if the storage rejects the write.
    pub fn write_artifact(&self, storage: &dyn Storage, code: &str) -> Result<PathBuf> {
        let path = self.root.join(artifact_name());
        storage
            .write(&path, code.as_bytes())
            .map_err(|e| PoisonError::CacheWriteFailure {
                path: path.clone(),
                source: Arc::new(e),
            })?;
        tracing::debug!("wrote compiled view {}", path.display());
        Ok(path)
    }
}

/// Deletes each entry, logging and skipping the ones that cannot be removed.
fn delete_all(storage: &dyn Storage, entries: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for entry in entries {
        match storage.delete(entry) {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!("could not delete compiled view: {}", e),
        }
    }
    deleted
}

/// Generates a unique artifact filename.
///
/// The name starts with the current time in microseconds (hex) so entries
/// sort by creation, followed by a random suffix against same-tick collisions.
pub fn artifact_name() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default();
    format!("poison.{:x}.{}.lua", micros, nanoid::nanoid!(10))
}
