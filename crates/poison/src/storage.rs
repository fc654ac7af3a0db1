// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Byte-level storage for view sources and compiled artifacts.
//!
//! The engine never touches the filesystem directly. View sources are read
//! and artifacts are written, listed and deleted through a [`Storage`]
//! implementation.
//!
//! # Implementations
//!
//! - [`FileSystemStorage`]: the real filesystem
//! - [`MemoryStorage`](crate::memory_storage::MemoryStorage): an in-memory map for tests
//!
//! # Custom Storage
//!
//! Implement [`Storage`] to keep views in a database, an archive or a
//! remote bucket.

use crate::error::{PoisonError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Trait for reading and writing engine files.
///
/// On the default `send` build, implementations must be thread-safe
/// because Lua callbacks hold on to the storage.
#[cfg(feature = "send")]
pub trait Storage: Send + Sync + std::fmt::Debug + 'static {
    /// Reads a file. Returns `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Writes a file, replacing any previous content.
    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;

    /// Lists the files directly inside `dir`, skipping subdirectories.
    /// A missing directory is empty.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Deletes a file.
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Trait for reading and writing engine files (single-threaded variant).
#[cfg(not(feature = "send"))]
pub trait Storage: std::fmt::Debug + 'static {
    /// Reads a file. Returns `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;
    /// Writes a file, replacing any previous content.
    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
    /// Lists the files directly inside `dir`, skipping subdirectories.
    /// A missing directory is empty.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;
    /// Deletes a file.
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Maps a dotted view name to its source path.
///
/// `layout.header` with root `views` and extension `.poison.html` becomes
/// `views/layout/header.poison.html` (with the platform separator).
pub fn view_path(views_root: &Path, view: &str, extension: &str) -> PathBuf {
    let mut path = views_root.to_path_buf();
    let mut segments = view.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{}{}", segment, extension));
        }
    }
    path
}

/// Filesystem-backed storage.
#[derive(Debug, Clone, Default)]
pub struct FileSystemStorage;

impl FileSystemStorage {
    /// Creates a filesystem storage.
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FileSystemStorage {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PoisonError::storage(path, e)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PoisonError::storage(dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PoisonError::storage(dir, e))?;
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => continue,
                Ok(_) => files.push(entry.path()),
                Err(e) => return Err(PoisonError::storage(entry.path(), e)),
            }
        }
        Ok(files)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).map_err(|e| PoisonError::storage(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_view_path() {
        let path = view_path(Path::new("views"), "layout.header", ".poison.html");
        assert_eq!(
            path,
            Path::new("views").join("layout").join("header.poison.html")
        );

        let path = view_path(Path::new("views"), "home", ".tpl");
        assert_eq!(path, Path::new("views").join("home.tpl"));
    }

    #[test]
    fn test_filesystem_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new();
        let file = temp_dir.path().join("nested").join("a.txt");

        assert_eq!(storage.read(&file).unwrap(), None);
        assert!(storage.list(&temp_dir.path().join("nested")).unwrap().is_empty());

        storage.write(&file, b"hello").unwrap();
        assert_eq!(storage.read(&file).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(
            storage.list(&temp_dir.path().join("nested")).unwrap(),
            vec![file.clone()]
        );

        storage.delete(&file).unwrap();
        assert_eq!(storage.read(&file).unwrap(), None);
    }

    #[test]
    fn test_list_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new();
        let file = temp_dir.path().join("a.lua");
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        storage.write(&file, b"return 1").unwrap();

        assert_eq!(storage.list(temp_dir.path()).unwrap(), vec![file]);
    }
}
