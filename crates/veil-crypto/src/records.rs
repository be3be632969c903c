//! # SecureRecordStore — Encrypted Named Records
//!
//! A keyed mapping from a logical name to an encrypted blob, backed by a
//! [`KeyValueStore`]. Records are serialized with `serde_json`, encrypted
//! via [`EncryptionService`], and persisted hex-encoded under a
//! `secure_`-prefixed storage key.
//!
//! ## Error Propagation
//!
//! A present-but-corrupt record surfaces as [`CryptoError::Decryption`] or
//! [`CryptoError::Deserialization`], never as `Ok(None)`. Mapping tampering
//! to absence would hide an integrity violation from the caller.
//!
//! ## clear_all Semantics
//!
//! `clear_all()` removes every record this store owns and then wipes the
//! key via [`KeyStore::wipe()`](crate::keystore::KeyStore::wipe). Any blob
//! encrypted under the old key but stored outside this store's prefix
//! becomes unrecoverable — deleting records and losing the capability to
//! decrypt them are the same end-state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::encryption::{EncryptedBlob, EncryptionService};
use crate::error::CryptoError;
use crate::storage::KeyValueStore;

/// Prefix for storage keys owned by a [`SecureRecordStore`].
const RECORD_PREFIX: &str = "secure_";

/// Transparent encrypt-on-write / decrypt-on-read record store.
#[derive(Debug, Clone)]
pub struct SecureRecordStore {
    store: Arc<dyn KeyValueStore>,
    crypto: EncryptionService,
}

impl SecureRecordStore {
    /// Create a record store over the given backend and encryption service.
    pub fn new(store: Arc<dyn KeyValueStore>, crypto: EncryptionService) -> Self {
        Self { store, crypto }
    }

    fn storage_key(name: &str) -> String {
        format!("{RECORD_PREFIX}{name}")
    }

    /// Serialize, encrypt, and persist a record under `name`.
    pub fn put<T: Serialize>(&self, name: &str, value: &T) -> Result<(), CryptoError> {
        let json = serde_json::to_vec(value)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;
        let blob = self.crypto.encrypt(&json)?;
        self.store
            .set(&Self::storage_key(name), blob.to_hex().as_bytes())?;
        debug!(record = name, "stored encrypted record");
        Ok(())
    }

    /// Load, decrypt, and deserialize the record under `name`.
    ///
    /// Returns `Ok(None)` only when no record exists at `name`.
    ///
    /// # Errors
    ///
    /// A record that is present but cannot be decrypted or deserialized is
    /// an error, never `Ok(None)`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CryptoError> {
        let Some(stored) = self.store.get(&Self::storage_key(name))? else {
            return Ok(None);
        };
        let hex = std::str::from_utf8(&stored).map_err(|_| CryptoError::Decryption)?;
        let blob = EncryptedBlob::from_hex(hex)?;
        let plain = self.crypto.decrypt(&blob)?;
        let value = serde_json::from_slice(&plain)
            .map_err(|e| CryptoError::Deserialization(e.to_string()))?;
        Ok(Some(value))
    }

    /// Remove the record under `name`. Removing an absent record is not an
    /// error.
    pub fn remove(&self, name: &str) -> Result<(), CryptoError> {
        self.store.remove(&Self::storage_key(name))
    }

    /// Remove every record this store owns, then wipe the key material.
    pub fn clear_all(&self) -> Result<(), CryptoError> {
        for key in self.store.keys()? {
            if key.starts_with(RECORD_PREFIX) {
                self.store.remove(&key)?;
            }
        }
        self.crypto.key_store().wipe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use crate::storage::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        proof_count: u64,
    }

    fn record_store() -> (Arc<MemoryStore>, SecureRecordStore) {
        let backend = Arc::new(MemoryStore::new());
        let keys = Arc::new(KeyStore::new(backend.clone()));
        let crypto = EncryptionService::new(keys);
        (backend.clone(), SecureRecordStore::new(backend, crypto))
    }

    #[test]
    fn put_get_round_trip() {
        let (_, records) = record_store();
        let session = Session {
            user: "alice".to_string(),
            proof_count: 7,
        };
        records.put("session", &session).expect("put");
        let loaded: Session = records.get("session").expect("get").expect("present");
        assert_eq!(loaded, session);
    }

    #[test]
    fn absent_record_is_none_not_error() {
        let (_, records) = record_store();
        let loaded: Option<Session> = records.get("nothing").expect("get");
        assert!(loaded.is_none());
    }

    #[test]
    fn records_are_encrypted_at_rest() {
        let (backend, records) = record_store();
        records
            .put("session", &Session { user: "alice".to_string(), proof_count: 1 })
            .unwrap();
        let raw = backend.get("secure_session").unwrap().expect("stored");
        let raw = String::from_utf8(raw).expect("hex utf8");
        assert!(!raw.contains("alice"));
    }

    #[test]
    fn corrupt_record_is_error_not_absence() {
        let (backend, records) = record_store();
        records
            .put("session", &Session { user: "a".to_string(), proof_count: 0 })
            .unwrap();
        // Flip a ciphertext byte in the stored hex.
        let mut raw = backend.get("secure_session").unwrap().unwrap();
        let last = raw.len() - 1;
        raw[last] = if raw[last] == b'0' { b'1' } else { b'0' };
        backend.set("secure_session", &raw).unwrap();

        let result: Result<Option<Session>, _> = records.get("session");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn wrong_shape_is_deserialization_error() {
        let (_, records) = record_store();
        records.put("number", &42u32).unwrap();
        let result: Result<Option<Session>, _> = records.get("number");
        assert!(matches!(result, Err(CryptoError::Deserialization(_))));
    }

    #[test]
    fn remove_then_get_is_none() {
        let (_, records) = record_store();
        records.put("gone", &1u8).unwrap();
        records.remove("gone").unwrap();
        let loaded: Option<u8> = records.get("gone").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn clear_all_removes_records_and_key() {
        let (backend, records) = record_store();
        records.put("a", &1u8).unwrap();
        records.put("b", &2u8).unwrap();
        backend.set("unrelated", b"kept").unwrap();

        records.clear_all().expect("clear_all");

        let a: Option<u8> = records.get("a").unwrap();
        assert!(a.is_none());
        assert_eq!(backend.get("privacy_key").unwrap(), None);
        // Keys outside the prefix are not this store's to delete.
        assert_eq!(backend.get("unrelated").unwrap().as_deref(), Some(&b"kept"[..]));
    }

    #[test]
    fn blob_outside_prefix_unreadable_after_clear_all() {
        // A blob encrypted under the old key but stored outside the
        // store's prefix survives clear_all and becomes unrecoverable.
        let backend = Arc::new(MemoryStore::new());
        let keys = Arc::new(KeyStore::new(backend.clone()));
        let crypto = EncryptionService::new(keys);
        let records = SecureRecordStore::new(backend.clone(), crypto.clone());

        let stale = crypto.encrypt(b"legacy secret").unwrap();
        backend.set("legacy", stale.to_hex().as_bytes()).unwrap();

        records.clear_all().unwrap();

        // A new key is generated on next use; the old blob fails the tag.
        let raw = backend.get("legacy").unwrap().unwrap();
        let blob = EncryptedBlob::from_hex(std::str::from_utf8(&raw).unwrap()).unwrap();
        assert!(matches!(crypto.decrypt(&blob), Err(CryptoError::Decryption)));
    }
}
