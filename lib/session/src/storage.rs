//! Durable key-value storage for the persisted session record.
//!
//! The session is stored as two string entries (`token` and `user`) in a
//! local, synchronous key-value store. Values are always replaced whole.

use emi_portal_core::Result;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::StorageError;

/// Key of the persisted bearer credential.
pub const TOKEN_KEY: &str = "token";

/// Key of the persisted, JSON-serialized user profile.
pub const USER_KEY: &str = "user";

/// Trait for local durable key-value storage.
///
/// Implementations must replace a value atomically on `set`, and treat
/// `delete` of a missing key as success.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing value could not be removed.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store keeping one file per key under a directory.
///
/// Writes go to a hidden temporary sibling first and are renamed into place,
/// so a reader never sees a partially written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(key))
    }

    fn invalid_key(key: &str) -> String {
        format!("invalid storage key '{key}'")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key).ok_or_else(|| StorageError::ReadFailed {
            key: key.to_string(),
            details: Self::invalid_key(key),
        })?;

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                details: e.to_string(),
            }
            .into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_failed = |details: String| StorageError::WriteFailed {
            key: key.to_string(),
            details,
        };

        let path = self
            .path_for(key)
            .ok_or_else(|| write_failed(Self::invalid_key(key)))?;
        fs::create_dir_all(&self.root).map_err(|e| write_failed(e.to_string()))?;

        let tmp = self.root.join(format!(".{key}.tmp"));
        let mut file = fs::File::create(&tmp).map_err(|e| write_failed(e.to_string()))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| write_failed(e.to_string()))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key).ok_or_else(|| StorageError::DeleteFailed {
            key: key.to_string(),
            details: Self::invalid_key(key),
        })?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed {
                key: key.to_string(),
                details: e.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get(TOKEN_KEY).expect("get"), None);

        store.set(TOKEN_KEY, "abc").expect("set");
        assert_eq!(store.get(TOKEN_KEY).expect("get"), Some("abc".to_string()));
        assert_eq!(store.len(), 1);

        store.delete(TOKEN_KEY).expect("delete");
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_delete_missing_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("missing").is_ok());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("session"));

        assert_eq!(store.get(USER_KEY).expect("get"), None);

        store.set(USER_KEY, r#"{"id":1}"#).expect("set");
        assert_eq!(
            store.get(USER_KEY).expect("get"),
            Some(r#"{"id":1}"#.to_string())
        );

        store.set(USER_KEY, "replaced").expect("overwrite");
        assert_eq!(store.get(USER_KEY).expect("get"), Some("replaced".to_string()));
    }

    #[test]
    fn file_store_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        store.set(TOKEN_KEY, "t").expect("set");

        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![TOKEN_KEY.to_string()]);
    }

    #[test]
    fn file_store_delete_missing_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        assert!(store.delete(TOKEN_KEY).is_ok());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.delete("").is_err());
    }
}
