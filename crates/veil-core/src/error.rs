//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types for the foundational layer. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Canonicalization failures carry the offending value.
//! - Parse failures include the rejected input for diagnostics; inputs
//!   at this layer are identifiers and digests, never plaintext secrets.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A digest string could not be parsed.
    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    /// A timestamp string could not be parsed or used a non-UTC offset.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A named field was absent from the payload it should be committed from.
    #[error("field named for commitment is absent from payload: {0:?}")]
    MissingField(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
