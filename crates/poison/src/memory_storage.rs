// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::error::{PoisonError, Result};
use crate::storage::{view_path, Storage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Memory-based storage that keeps files in a map keyed by path.
///
/// Clones share the same files, so a test can keep a handle to inspect
/// the cache directory after handing a clone to the renderer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create a new, empty memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Helper to access files with a mutable reference
    fn with_files<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BTreeMap<PathBuf, Vec<u8>>) -> R,
    {
        let mut files = self
            .files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut files)
    }

    /// Add a file at an exact path
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: &str) {
        self.with_files(|files| {
            files.insert(path.as_ref().to_path_buf(), content.as_bytes().to_vec());
        });
    }

    /// Add a view by dotted name under `views_root` with `extension`
    pub fn add_view<P: AsRef<Path>>(&self, views_root: P, view: &str, extension: &str, content: &str) {
        self.add_file(view_path(views_root.as_ref(), view, extension), content);
    }

    /// Read a file back as text, if present
    pub fn file(&self, path: &Path) -> Option<String> {
        self.with_files(|files| {
            files
                .get(path)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        })
    }

    /// Number of files directly inside `dir`
    pub fn count_in(&self, dir: &Path) -> usize {
        self.with_files(|files| files.keys().filter(|p| p.parent() == Some(dir)).count())
    }

    /// Make every subsequent write and delete fail (to exercise failure paths)
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.with_files(|files| files.get(path).cloned()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "memory storage is read-only",
            ));
        }
        self.with_files(|files| {
            files.insert(path.to_path_buf(), contents.to_vec());
        });
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self.with_files(|files| {
            files
                .keys()
                .filter(|p| p.parent() == Some(dir))
                .cloned()
                .collect()
        }))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(PoisonError::storage(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "memory storage is read-only"),
            ));
        }
        self.with_files(|files| {
            files.remove(path);
        });
        Ok(())
    }
}
