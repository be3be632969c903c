//! # Cryptographic Error Types
//!
//! Structured errors for all cryptographic operations in `veil-crypto`.
//! Uses `thiserror` for ergonomic error definitions with diagnostic context.
//!
//! ## Design
//!
//! `Decryption` is a single variant with a fixed message: a tag mismatch
//! and a malformed ciphertext are indistinguishable to the caller, so the
//! error cannot be used as a padding/tamper oracle.

use thiserror::Error;

/// Errors from cryptographic operations in the Veil core.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Persisted key material exists but is corrupt or unparseable.
    /// The caller decides whether to wipe-and-regenerate or abort;
    /// the key is never silently regenerated over existing ciphertext.
    #[error("key load failed: {0}")]
    KeyLoad(String),

    /// AEAD encryption failed.
    #[error("encryption failed")]
    Encryption,

    /// Authentication tag mismatch or malformed ciphertext.
    #[error("decryption failed: authentication tag mismatch or malformed ciphertext")]
    Decryption,

    /// Decrypted bytes did not match the expected record shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A record could not be serialized for storage.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The persistence backend rejected an operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error from a filesystem-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_message_is_fixed() {
        // Tamper and corruption must render identically.
        let msg = format!("{}", CryptoError::Decryption);
        assert!(msg.contains("tag mismatch or malformed"));
    }

    #[test]
    fn key_load_carries_context() {
        let err = CryptoError::KeyLoad("odd length".to_string());
        assert!(format!("{err}").contains("odd length"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = CryptoError::from(io_err);
        assert!(format!("{err}").contains("file missing"));
    }
}
