//! # veil-crypto — Cryptographic Services
//!
//! Provides the confidentiality layer of the Veil privacy client core:
//!
//! - **KeyStore**: lifecycle of the single AES-256 key — generated on first
//!   use, loaded from persistence thereafter, explicitly destroyable.
//! - **EncryptionService**: AES-256-GCM authenticated encryption with a
//!   fresh random nonce per call, plus keyless content commitments.
//! - **SecureRecordStore**: encrypt-on-write / decrypt-on-read persistence
//!   of named records.
//! - **KeyValueStore**: the persistence collaborator abstraction, with
//!   in-memory and filesystem backends.
//!
//! ## Crate Policy
//!
//! - Depends only on `veil-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   AES-256-GCM and real SHA-256.
//! - A failed decrypt surfaces to the caller; it is never mapped to
//!   "record absent".
//! - `unsafe` prohibited.

pub mod encryption;
pub mod error;
pub mod keystore;
pub mod records;
pub mod storage;

pub use encryption::{EncryptedBlob, EncryptionService, NONCE_LEN};
pub use error::CryptoError;
pub use keystore::{KeyStore, SecretKey, KEY_LEN};
pub use records::SecureRecordStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
