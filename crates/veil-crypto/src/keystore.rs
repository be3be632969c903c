//! # KeyStore — Symmetric Key Lifecycle
//!
//! Owns the single AES-256 key for a device profile. The key is generated
//! from the OS CSPRNG on first use, persisted as 64 lowercase hex chars
//! under the `privacy_key` storage slot, and loaded on every later start.
//!
//! ## Security Invariants
//!
//! - Exactly one live key. `ensure_key()` is idempotent: initialization
//!   happens under a write lock with a second look at both the cache and
//!   the persisted slot, so a concurrent initializer observes the first
//!   caller's key rather than overwriting it.
//! - Corrupt persisted key material fails with [`CryptoError::KeyLoad`].
//!   Silent regeneration would orphan every previously encrypted record,
//!   so the caller must explicitly `wipe()` first.
//! - `wipe()` removes the persisted blob and clears the in-memory copy
//!   under one write lock — no observable state where one exists without
//!   the other.
//! - Key material is zeroized on drop.
//!
//! ## Concurrency
//!
//! The key slot is a `parking_lot::RwLock`: encrypt/decrypt take read
//! access, creation and wipe take write access. An encrypt racing a wipe
//! therefore sees either the old key or a cleared slot, never a partial
//! reference.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::storage::KeyValueStore;

/// Length of the symmetric key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Storage slot the serialized key lives under.
const KEY_STORAGE_SLOT: &str = "privacy_key";

/// A 256-bit symmetric key. Zeroized on drop; `Debug` is redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Deserialize from 64 lowercase hex chars.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] on wrong length or non-hex input.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        if hex.len() != KEY_LEN * 2 {
            return Err(CryptoError::KeyLoad(format!(
                "expected {} hex chars, got {}",
                KEY_LEN * 2,
                hex.len()
            )));
        }
        if hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(CryptoError::KeyLoad("key hex must be lowercase".to_string()));
        }
        let mut bytes = [0u8; KEY_LEN];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| CryptoError::KeyLoad("non-utf8 key material".to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| CryptoError::KeyLoad(format!("invalid hex pair: {pair:?}")))?;
        }
        Ok(Self(bytes))
    }

    /// Serialize to 64 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Raw key bytes for cipher construction.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Manages the single symmetric key for a device profile.
///
/// Constructed once at application start and shared by handle; there is no
/// global instance.
pub struct KeyStore {
    store: Arc<dyn KeyValueStore>,
    key: RwLock<Option<SecretKey>>,
}

impl KeyStore {
    /// Create a key store over the given persistence backend.
    ///
    /// No key is loaded or generated until first use.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: RwLock::new(None),
        }
    }

    /// Ensure the key exists: load the persisted key if present, generate
    /// and persist one otherwise. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyLoad`] if persisted key material exists
    /// but is corrupt. The caller decides whether to [`wipe()`](Self::wipe)
    /// and retry or abort.
    pub fn ensure_key(&self) -> Result<(), CryptoError> {
        let mut slot = self.key.write();
        if slot.is_some() {
            return Ok(());
        }
        match self.store.get(KEY_STORAGE_SLOT)? {
            Some(persisted) => {
                let hex = std::str::from_utf8(&persisted)
                    .map_err(|_| CryptoError::KeyLoad("persisted key is not utf-8".to_string()))?;
                *slot = Some(SecretKey::from_hex(hex)?);
                debug!("loaded persisted encryption key");
            }
            None => {
                let key = SecretKey::generate();
                self.store.set(KEY_STORAGE_SLOT, key.to_hex().as_bytes())?;
                *slot = Some(key);
                info!("generated and persisted new encryption key");
            }
        }
        Ok(())
    }

    /// Whether a key is currently cached in memory.
    pub fn is_initialized(&self) -> bool {
        self.key.read().is_some()
    }

    /// Remove the persisted key and clear the in-memory copy together.
    ///
    /// Runs under the write lock, so no encrypt/decrypt observes a
    /// half-updated key reference. If removal from the backend fails,
    /// both copies are left intact.
    pub fn wipe(&self) -> Result<(), CryptoError> {
        let mut slot = self.key.write();
        self.store.remove(KEY_STORAGE_SLOT)?;
        *slot = None; // SecretKey zeroizes on drop
        warn!("encryption key wiped; previously encrypted data is unrecoverable");
        Ok(())
    }

    /// Run `f` with read access to the key, initializing it first if needed.
    pub(crate) fn with_key<T>(
        &self,
        f: impl FnOnce(&SecretKey) -> Result<T, CryptoError>,
    ) -> Result<T, CryptoError> {
        {
            let slot = self.key.read();
            if let Some(key) = slot.as_ref() {
                return f(key);
            }
        }
        self.ensure_key()?;
        let slot = self.key.read();
        match slot.as_ref() {
            Some(key) => f(key),
            // A wipe slipped in between ensure_key and the read lock.
            None => Err(CryptoError::KeyLoad("key wiped during operation".to_string())),
        }
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
