//! Key-value storage backends.
//!
//! The store only needs an opaque string-to-string map. Two backends ship:
//!
//! - [`MemoryStorage`]: in-process map, used by tests and ephemeral sessions.
//! - [`FileStorage`]: one JSON file per key inside a directory (requires the
//!   `file-storage` feature).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure, invalid key | Returns error, nothing written |
//! | `StorageError::Serialization` | JSON encode/decode | Caller skips the entry and logs |
//! | `StorageError::Corruption` | Poisoned lock, unreadable payload | Returns error |
//! | `StorageError::Unavailable` | Backend cannot be used | Returns error |

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Errors raised by storage backends.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Stored data is corrupted or the backend state is poisoned.
    Corruption(String),
    /// Backend is not available.
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_)
            | StorageError::Corruption(_)
            | StorageError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Opaque key-value backend.
///
/// Implementations must be thread-safe (`Send + Sync`) so a store can be
/// shared behind an `Arc`.
pub trait StorageBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// All keys currently stored, sorted.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Check if the backend is available and functional.
    fn is_available(&self) -> bool {
        true
    }
}

/// In-memory storage backend for testing and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().map(|g| g.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Corruption("lock poisoned".into())
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.data.read().map_err(|_| poisoned())?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(|_| poisoned())?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut guard = self.data.write().map_err(|_| poisoned())?;
        guard.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let guard = self.data.read().map_err(|_| poisoned())?;
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(feature = "file-storage")]
mod file_storage {
    use super::*;
    use std::fs::{self, File};
    use std::io::{BufWriter, ErrorKind, Write};
    use std::path::{Path, PathBuf};

    const EXTENSION: &str = "json";
    const TEMP_EXTENSION: &str = "json.tmp";

    /// Directory-backed storage: each key is a `<key>.json` file.
    ///
    /// Writes use a temporary file + rename so a crash never leaves a
    /// half-written value behind:
    /// 1. Write to `<key>.json.tmp`
    /// 2. Flush and sync
    /// 3. Rename `<key>.json.tmp` -> `<key>.json`
    ///
    /// Keys are restricted to ASCII alphanumerics, `.`, `-` and `_`.
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        /// Storage rooted at `dir`. The directory is created on first write.
        #[must_use]
        pub fn new(dir: impl AsRef<Path>) -> Self {
            Self {
                dir: dir.as_ref().to_path_buf(),
            }
        }

        /// Directory holding the entries.
        #[must_use]
        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn key_path(&self, key: &str, extension: &str) -> StorageResult<PathBuf> {
            let valid = !key.is_empty()
                && !key.starts_with('.')
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
            if !valid {
                return Err(StorageError::Io(std::io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid storage key {key:?}"),
                )));
            }
            Ok(self.dir.join(format!("{key}.{extension}")))
        }
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            let path = self.key_path(key, EXTENSION)?;
            match fs::read_to_string(&path) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn put(&self, key: &str, value: &str) -> StorageResult<()> {
            let path = self.key_path(key, EXTENSION)?;
            let tmp_path = self.key_path(key, TEMP_EXTENSION)?;
            fs::create_dir_all(&self.dir)?;
            {
                let file = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(file);
                writer.write_all(value.as_bytes())?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &path)?;
            tracing::debug!(path = %path.display(), bytes = value.len(), "stored entry");
            Ok(())
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            let path = self.key_path(key, EXTENSION)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            let entries = match fs::read_dir(&self.dir) {
                Ok(entries) => entries,
                // First run - nothing stored yet
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };
            let mut keys = Vec::new();
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                if let Some(key) = name.strip_suffix(".json") {
                    keys.push(key.to_owned());
                }
            }
            keys.sort_unstable();
            Ok(keys)
        }

        fn is_available(&self) -> bool {
            if fs::create_dir_all(&self.dir).is_err() {
                return false;
            }
            let probe = self.dir.join(".pagespec_test_write");
            if fs::write(&probe, b"test").is_ok() {
                let _ = fs::remove_file(&probe);
                return true;
            }
            false
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage").field("dir", &self.dir).finish()
        }
    }
}

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_put_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());
        storage.put("a", "1").expect("put");
        storage.put("b", "2").expect("put");
        storage.put("a", "3").expect("overwrite");
        assert_eq!(storage.get("a").expect("get").as_deref(), Some("3"));
        assert_eq!(storage.keys().expect("keys"), vec!["a", "b"]);
        storage.remove("a").expect("remove");
        storage.remove("a").expect("remove missing");
        assert_eq!(storage.get("a").expect("get"), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::Corruption("bad".into());
        assert_eq!(err.to_string(), "storage corruption: bad");
        let err: StorageError = std::io::Error::other("disk").into();
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "file-storage")]
    mod file {
        use super::*;

        #[test]
        fn file_storage_round_trip_and_keys() {
            let dir = tempfile::tempdir().expect("tempdir");
            let storage = FileStorage::new(dir.path().join("nested"));
            assert!(storage.keys().expect("keys before first write").is_empty());
            assert_eq!(storage.get("spec_1").expect("get"), None);

            storage.put("spec_1", "{\"a\":1}").expect("put");
            storage.put("index", "[]").expect("put");
            assert_eq!(storage.keys().expect("keys"), vec!["index", "spec_1"]);
            assert_eq!(
                storage.get("spec_1").expect("get").as_deref(),
                Some("{\"a\":1}")
            );
            assert!(!storage.dir().join("spec_1.json.tmp").exists());

            storage.remove("spec_1").expect("remove");
            storage.remove("spec_1").expect("remove missing");
            assert_eq!(storage.keys().expect("keys"), vec!["index"]);
            assert!(storage.is_available());
        }

        #[test]
        fn file_storage_rejects_path_like_keys() {
            let dir = tempfile::tempdir().expect("tempdir");
            let storage = FileStorage::new(dir.path());
            for key in ["", "../escape", "a/b", ".hidden"] {
                assert!(
                    matches!(storage.put(key, "x"), Err(StorageError::Io(_))),
                    "{key:?}"
                );
            }
        }
    }
}
