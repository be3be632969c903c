//! # veil-core — Foundational Types for the Veil Privacy Core
//!
//! This crate is the bedrock of the Veil privacy client. It defines the
//! type-system primitives that the crypto and proof layers build on. Every
//! other crate in the workspace depends on `veil-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** ALL commitment computation over
//!    structured data flows through `CanonicalBytes::new()`. No raw
//!    `serde_json::to_vec()` for digests. This prevents the
//!    canonicalization split defect class by construction.
//!
//! 2. **`Commitment` is one-way and keyless.** A commitment binds to data
//!    without revealing it and must be verifiable by a party that holds
//!    only the digest, never the encryption key.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision.
//!
//! 4. **Wire format at the boundary.** Commitments render as `0x` +
//!    64 lowercase hex chars when displayed; internal hex is unprefixed.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `veil-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a storage boundary.

pub mod canonical;
pub mod commitment;
pub mod error;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use commitment::{commit_fields, Commitment, COMMITMENT_LEN};
pub use error::CoreError;
pub use temporal::Timestamp;
