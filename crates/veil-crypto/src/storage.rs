//! # Key-Value Persistence Collaborator
//!
//! Abstracts the external key-value store (browser local storage, a file
//! tree, an OS keychain) behind the [`KeyValueStore`] trait. The
//! [`KeyStore`](crate::keystore::KeyStore) and
//! [`SecureRecordStore`](crate::records::SecureRecordStore) are the only
//! consumers.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`]: process-local map for development and testing.
//! - [`FileStore`]: one file per key under a root directory.
//!
//! Values stored here are already encrypted or non-secret (the persisted
//! key blob is the exception and is the reason `wipe()` exists).

use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::error::CryptoError;

/// Trait for key-value persistence backends.
///
/// Implementations must be `Send + Sync` for use behind an `Arc` across
/// threads. Keys are internal identifiers (e.g. `privacy_key`,
/// `secure_session`) — short, filesystem-safe names.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the bytes stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CryptoError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CryptoError>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), CryptoError>;

    /// Enumerate every key currently present.
    fn keys(&self) -> Result<Vec<String>, CryptoError>;
}

impl std::fmt::Debug for dyn KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyValueStore")
    }
}

/// In-memory key-value store for development and testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CryptoError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CryptoError> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CryptoError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CryptoError> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

/// Filesystem-backed key-value store: one file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CryptoError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CryptoError> {
        // Keys are internal identifiers; path separators would escape root.
        if key.is_empty() || key.contains(['/', '\\', '\0']) || key == "." || key == ".." {
            return Err(CryptoError::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CryptoError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CryptoError> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CryptoError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CryptoError> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
