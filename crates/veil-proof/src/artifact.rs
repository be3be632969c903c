//! # Witness and ProofArtifact
//!
//! The `Witness` is what the engine derives from a request during the
//! WitnessGeneration stage: a commitment over the private fields plus one
//! public signal per public field. Only commitments are carried forward —
//! private values never reach the prover boundary in the clear.
//!
//! The `ProofArtifact` is the prover's output. It is immutable after
//! creation: all fields are private with read-only accessors, and it is
//! owned exclusively by the engine until handed to the verifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veil_core::{commit_fields, Commitment, CoreError, Timestamp};

use crate::request::ProofRequest;

/// Commitments derived from a request's classified payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    digest: Commitment,
    public_signals: Vec<Commitment>,
}

impl Witness {
    /// Derive the witness from a request.
    ///
    /// The digest commits to the canonicalized private-field subset. Each
    /// public field yields one signal — a commitment over that single
    /// field — ordered by field name, so `public_signals.len()` equals the
    /// number of public fields.
    pub fn derive(request: &ProofRequest) -> Result<Self, CoreError> {
        let digest = commit_fields(request.payload(), request.private_fields())?;
        let mut public_signals = Vec::with_capacity(request.public_fields().len());
        for field in request.public_fields() {
            public_signals.push(commit_fields(request.payload(), std::iter::once(field))?);
        }
        Ok(Self {
            digest,
            public_signals,
        })
    }

    /// Commitment over the private fields.
    pub fn digest(&self) -> Commitment {
        self.digest
    }

    /// One commitment per public field, in field-name order.
    pub fn public_signals(&self) -> &[Commitment] {
        &self.public_signals
    }
}

/// The proof object returned by the prover collaborator.
///
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    id: Uuid,
    digest: Commitment,
    proof_bytes: Vec<u8>,
    public_signals: Vec<Commitment>,
    created_at: Timestamp,
}

impl ProofArtifact {
    /// Assemble an artifact. Called by prover implementations.
    pub fn new(digest: Commitment, proof_bytes: Vec<u8>, public_signals: Vec<Commitment>) -> Self {
        Self {
            id: Uuid::new_v4(),
            digest,
            proof_bytes,
            public_signals,
            created_at: Timestamp::now(),
        }
    }

    /// Opaque handle for this artifact.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The witness digest this proof is bound to.
    pub fn digest(&self) -> Commitment {
        self.digest
    }

    /// Opaque proof bytes.
    pub fn proof_bytes(&self) -> &[u8] {
        &self.proof_bytes
    }

    /// Public signals, one per public field.
    pub fn public_signals(&self) -> &[Commitment] {
        &self.public_signals
    }

    /// When the prover produced this artifact.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
