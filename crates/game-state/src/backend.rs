//! Durable key/value backends for the game-state store.
//!
//! The store writes one whole JSON record per key; backends only need to
//! read and replace that record.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Storage the game-state store flushes into.
pub trait DurableBackend: Send + Sync {
    /// Read the record stored under `key`, or `None` when nothing was written yet.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the record stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: DurableBackend + ?Sized> DurableBackend for Box<T> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }
}

/// File-backed storage: key `K` lives at `<dir>/K.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create state directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DurableBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path_for(key).parent() {
            fs::create_dir_all(parent)?;
        }

        let path = self.path_for(key);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                StoreError::Io(format!("Failed to open {} for writing: {}", path.display(), e))
            })?;

        file.write_all(value.as_bytes())?;
        file.flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// In-memory storage. Clones share the same map, so a second store built
/// from a clone sees what the first one flushed.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record, bypassing the store.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.records
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }
}

impl DurableBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert_raw(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_backend_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();
        assert!(backend.read("gameState").unwrap().is_none());
    }

    #[test]
    fn file_backend_write_replaces_record() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();

        backend.write("gameState", "{\"a\":1,\"long\":true}").unwrap();
        backend.write("gameState", "{}").unwrap();

        assert_eq!(backend.read("gameState").unwrap().as_deref(), Some("{}"));
        assert!(backend.path_for("gameState").ends_with("gameState.json"));
    }

    #[test]
    fn file_backend_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("state");

        let backend = FileBackend::new(&dir).unwrap();
        assert!(backend.dir().is_dir());
    }

    #[test]
    fn memory_backend_clones_share_records() {
        let backend = MemoryBackend::new();
        let other = backend.clone();

        backend.write("k", "v").unwrap();
        assert_eq!(other.read("k").unwrap().as_deref(), Some("v"));
    }
}
