//! # Storage Backends
//!
//! Key/value string storage behind one trait. Backends take `&self` so a
//! single backend can be shared (via `Arc`) by the collection repository and
//! the rate limiter.
//!
//! - [`MemoryStorage`] - process memory, lost on exit
//! - [`FileStorage`] - one file per key, atomic writes
//! - [`FallbackStorage`] - a primary backend that degrades to memory

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Key/value persistence for save blobs.
pub trait StorageBackend: Send + Sync {
    /// Reads a value. `Ok(None)` if the key was never written.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// File storage: `<dir>/<key>.json` per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// The directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a key. Keys are restricted to `[A-Za-z0-9_-]`.
    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;

        debug!(key, bytes = value.len(), path = %path.display(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// A primary backend that switches to memory for the rest of the session
/// after its first failure.
pub struct FallbackStorage {
    primary: Box<dyn StorageBackend>,
    memory: MemoryStorage,
    degraded: AtomicBool,
}

impl FallbackStorage {
    /// Wraps a primary backend.
    #[must_use]
    pub fn new(primary: Box<dyn StorageBackend>) -> Self {
        Self {
            primary,
            memory: MemoryStorage::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the primary has failed and memory is in use.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, op: &str, error: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(op, %error, "storage unavailable, continuing in memory");
        }
    }
}

impl std::fmt::Debug for FallbackStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackStorage")
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}

impl StorageBackend for FallbackStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if !self.is_degraded() {
            match self.primary.get(key) {
                Ok(value) => return Ok(value),
                Err(e) => self.degrade("get", &e),
            }
        }
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if !self.is_degraded() {
            match self.primary.set(key, value) {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade("set", &e),
            }
        }
        self.memory.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        if !self.is_degraded() {
            match self.primary.remove(key) {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade("remove", &e),
            }
        }
        self.memory.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Fails every call and counts attempts.
    #[derive(Default)]
    struct BrokenStorage {
        calls: AtomicUsize,
    }

    impl BrokenStorage {
        fn fail(&self) -> StorageError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StorageError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "read-only"))
        }
    }

    impl StorageBackend for BrokenStorage {
        fn get(&self, _: &str) -> StorageResult<Option<String>> {
            Err(self.fail())
        }
        fn set(&self, _: &str, _: &str) -> StorageResult<()> {
            Err(self.fail())
        }
        fn remove(&self, _: &str) -> StorageResult<()> {
            Err(self.fail())
        }
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.len(), 1);
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::open(temp_dir.path().join("saves")).unwrap();

        assert_eq!(storage.get("dadddeck_collection").unwrap(), None);
        storage.set("dadddeck_collection", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get("dadddeck_collection").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        // No temp file left behind
        let leftovers: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());

        storage.remove("dadddeck_collection").unwrap();
        storage.remove("dadddeck_collection").unwrap();
        assert_eq!(storage.get("dadddeck_collection").unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        FileStorage::open(temp_dir.path()).unwrap().set("key", "value").unwrap();
        let reopened = FileStorage::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::open(temp_dir.path()).unwrap();
        for key in ["", "../escape", "a/b", "dot.key"] {
            assert!(matches!(storage.set(key, "x"), Err(StorageError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn test_fallback_uses_primary_when_healthy() {
        let temp_dir = TempDir::new().unwrap();
        let fallback = FallbackStorage::new(Box::new(FileStorage::open(temp_dir.path()).unwrap()));
        fallback.set("key", "value").unwrap();
        assert!(!fallback.is_degraded());
        assert!(temp_dir.path().join("key.json").exists());
    }

    #[test]
    fn test_fallback_degrades_permanently() {
        let broken = Arc::new(BrokenStorage::default());
        let fallback = FallbackStorage::new(Box::new(Arc::clone(&broken)));

        fallback.set("key", "value").unwrap();
        assert!(fallback.is_degraded());
        assert_eq!(fallback.get("key").unwrap().as_deref(), Some("value"));
        fallback.remove("key").unwrap();
        assert_eq!(fallback.get("key").unwrap(), None);

        // Only the first call reached the primary.
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
    }
}
