//! # EncryptionService — Authenticated Encryption and Commitments
//!
//! AES-256-GCM over the [`KeyStore`](crate::keystore::KeyStore) key, plus
//! keyless content commitments for the proof layer.
//!
//! ## Security Invariants
//!
//! - The nonce is 96 bits of fresh OS randomness generated inline at each
//!   `encrypt` call. There is no cached or caller-supplied nonce path, so
//!   nonce reuse under the same key cannot be expressed in this API.
//! - Blob framing is `nonce ‖ ciphertext ‖ tag`. The nonce is not secret;
//!   prepending it is what lets `decrypt` recover it.
//! - Tag mismatch and malformed input both surface as the single
//!   [`CryptoError::Decryption`] variant.
//! - Commitments involve no key material: a verifier holding only the
//!   digest can check one.

use std::collections::BTreeMap;
use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use veil_core::{commit_fields, Commitment};

use crate::error::CryptoError;
use crate::keystore::KeyStore;

/// Length of the AES-GCM nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// An encrypted payload: `nonce ‖ ciphertext ‖ tag` as one byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    /// Wrap raw combined bytes, checking the minimum framing length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] if the input is too short to
    /// contain a nonce and a tag.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Decryption);
        }
        Ok(Self(bytes))
    }

    /// The combined `nonce ‖ ciphertext ‖ tag` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the blob, yielding the combined bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The 96-bit nonce prefix.
    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_LEN]
    }

    /// The ciphertext (tag included, as GCM emits it).
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[NONCE_LEN..]
    }

    /// Lowercase hex encoding for at-rest storage.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode from lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] on odd length, non-hex or
    /// uppercase input, or a byte sequence too short for the framing.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        if hex.len() % 2 != 0 || hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(CryptoError::Decryption);
        }
        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for chunk in hex.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(chunk).map_err(|_| CryptoError::Decryption)?;
            bytes.push(u8::from_str_radix(pair, 16).map_err(|_| CryptoError::Decryption)?);
        }
        Self::from_bytes(bytes)
    }
}

/// Authenticated encryption and content commitments over the profile key.
///
/// Cheap to clone; shares the underlying [`KeyStore`].
#[derive(Debug, Clone)]
pub struct EncryptionService {
    keys: Arc<KeyStore>,
}

impl EncryptionService {
    /// Create a service over the given key store.
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Handle to the underlying key store.
    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    /// Encrypt a plaintext under the profile key with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError> {
        self.keys.with_key(|key| {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
            let mut nonce_bytes = [0u8; NONCE_LEN];
            OsRng.fill_bytes(&mut nonce_bytes);
            let nonce = Nonce::from_slice(&nonce_bytes);
            let ciphertext = cipher
                .encrypt(nonce, plaintext)
                .map_err(|_| CryptoError::Encryption)?;

            let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            combined.extend_from_slice(&nonce_bytes);
            combined.extend_from_slice(&ciphertext);
            EncryptedBlob::from_bytes(combined)
        })
    }

    /// Decrypt a blob, verifying the authentication tag.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] on tag mismatch or malformed
    /// input — the two are deliberately indistinguishable.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError> {
        self.keys.with_key(|key| {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
            let nonce = Nonce::from_slice(blob.nonce());
            cipher
                .decrypt(nonce, blob.ciphertext())
                .map_err(|_| CryptoError::Decryption)
        })
    }

    /// Commit to an opaque byte payload. Keyless and deterministic.
    pub fn commit(&self, data: &[u8]) -> Commitment {
        Commitment::of_bytes(data)
    }

    /// Commit to a named subset of a payload's fields.
    ///
    /// Canonicalizes the subset (JCS key ordering) before hashing, so the
    /// commitment is reproducible across implementations.
    pub fn hash_fields<'a>(
        &self,
        payload: &BTreeMap<String, String>,
        fields: impl IntoIterator<Item = &'a String>,
    ) -> Result<Commitment, CryptoError> {
        commit_fields(payload, fields).map_err(|e| CryptoError::Serialization(e.to_string()))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    proptest! {
        /// decrypt(encrypt(p)) == p for arbitrary payloads.
        #[test]
        fn round_trip_any_plaintext(plaintext in prop::collection::vec(any::<u8>(), 0..512)) {
            let keys = Arc::new(KeyStore::new(Arc::new(MemoryStore::new())));
            let svc = EncryptionService::new(keys);
            let blob = svc.encrypt(&plaintext).unwrap();
            prop_assert_eq!(svc.decrypt(&blob).unwrap(), plaintext);
        }
    }
}
