//! # Prover and Verifier Collaborators
//!
//! The actual proving system is an external capability behind the
//! [`Prover`] and [`Verifier`] traits. Two implementations ship with the
//! crate:
//!
//! - [`TransparentProver`] / [`TransparentVerifier`]: deterministic
//!   SHA-256-based transparent "proofs". The proof bytes are a keyless
//!   expansion of the witness digest, and the verifier recomputes the
//!   expansion and compares. No zero-knowledge guarantees — this is the
//!   stand-in backend until a real proving system is integrated.
//! - [`FixedProver`] / [`FixedVerifier`]: test doubles with configurable
//!   outcome and artificial latency, so timeout and cancellation behavior
//!   can be tested reproducibly.
//!
//! Calls may block for as long as real proving work takes; the engine runs
//! them on a blocking thread under a timeout.

use std::time::Duration;

use thiserror::Error;

use veil_core::Commitment;

use crate::artifact::{ProofArtifact, Witness};
use crate::request::ProofRequest;

/// Error from the prover collaborator.
#[derive(Error, Debug)]
pub enum ProverError {
    /// The prover cannot be reached or is overloaded. Retryable.
    #[error("prover unavailable: {0}")]
    Unavailable(String),

    /// The prover rejected the request as malformed. Caller bug.
    #[error("prover rejected request: {0}")]
    InvalidRequest(String),
}

/// Error from the verifier collaborator.
#[derive(Error, Debug)]
pub enum VerifierError {
    /// The verifier cannot be reached. Retryable.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// External capability that turns a request and witness into a proof.
pub trait Prover: Send + Sync {
    /// Generate a proof artifact for the witness.
    fn generate_proof(
        &self,
        request: &ProofRequest,
        witness: &Witness,
    ) -> Result<ProofArtifact, ProverError>;
}

/// External capability that checks a proof artifact.
pub trait Verifier: Send + Sync {
    /// Returns `Ok(true)` if the proof is valid, `Ok(false)` if it is
    /// well-formed but does not verify.
    fn verify(&self, artifact: &ProofArtifact) -> Result<bool, VerifierError>;
}

/// Number of 32-byte blocks in a transparent proof (256 bytes total).
const TRANSPARENT_PROOF_BLOCKS: usize = 8;

/// Deterministic expansion of the witness digest into proof bytes:
/// an 8-block SHA-256 chain seeded by the digest.
fn transparent_proof_bytes(digest: &Commitment) -> Vec<u8> {
    let mut out = Vec::with_capacity(TRANSPARENT_PROOF_BLOCKS * 32);
    let mut block = *digest.as_bytes();
    for _ in 0..TRANSPARENT_PROOF_BLOCKS {
        block = *Commitment::of_bytes(&block).as_bytes();
        out.extend_from_slice(&block);
    }
    out
}

/// Transparent SHA-256-based prover. Deterministic, keyless, no privacy
/// guarantees beyond what the commitments already provide.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransparentProver;

impl Prover for TransparentProver {
    fn generate_proof(
        &self,
        _request: &ProofRequest,
        witness: &Witness,
    ) -> Result<ProofArtifact, ProverError> {
        let digest = witness.digest();
        Ok(ProofArtifact::new(
            digest,
            transparent_proof_bytes(&digest),
            witness.public_signals().to_vec(),
        ))
    }
}

/// Verifier for [`TransparentProver`] artifacts: recomputes the expansion
/// from the artifact digest and compares.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransparentVerifier;

impl Verifier for TransparentVerifier {
    fn verify(&self, artifact: &ProofArtifact) -> Result<bool, VerifierError> {
        Ok(artifact.proof_bytes() == transparent_proof_bytes(&artifact.digest()))
    }
}

/// What a fixed backend should do when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedOutcome {
    Succeed,
    Unavailable,
}

/// Prover test double: transparent artifacts with configurable latency
/// and failure.
#[derive(Debug, Clone)]
pub struct FixedProver {
    delay: Duration,
    outcome: FixedOutcome,
}

impl FixedProver {
    /// A prover that always succeeds immediately.
    pub fn succeeding() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: FixedOutcome::Succeed,
        }
    }

    /// A prover that always fails with [`ProverError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: FixedOutcome::Unavailable,
        }
    }

    /// Block for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Prover for FixedProver {
    fn generate_proof(
        &self,
        request: &ProofRequest,
        witness: &Witness,
    ) -> Result<ProofArtifact, ProverError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.outcome {
            FixedOutcome::Succeed => TransparentProver.generate_proof(request, witness),
            FixedOutcome::Unavailable => {
                Err(ProverError::Unavailable("fixed prover is down".to_string()))
            }
        }
    }
}

/// Verifier test double: fixed verdict with configurable latency.
#[derive(Debug, Clone)]
pub struct FixedVerifier {
    delay: Duration,
    verdict: Option<bool>,
}

impl FixedVerifier {
    /// A verifier that accepts every artifact.
    pub fn accepting() -> Self {
        Self {
            delay: Duration::ZERO,
            verdict: Some(true),
        }
    }

    /// A verifier that rejects every artifact.
    pub fn rejecting() -> Self {
        Self {
            delay: Duration::ZERO,
            verdict: Some(false),
        }
    }

    /// A verifier that always fails with [`VerifierError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            delay: Duration::ZERO,
            verdict: None,
        }
    }

    /// Block for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Verifier for FixedVerifier {
    fn verify(&self, _artifact: &ProofArtifact) -> Result<bool, VerifierError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.verdict {
            Some(v) => Ok(v),
            None => Err(VerifierError::Unavailable(
                "fixed verifier is down".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ProofKind;
    use std::collections::{BTreeMap, BTreeSet};

    fn request() -> ProofRequest {
        let payload: BTreeMap<String, String> = [("doc", "contents"), ("owner", "alice")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let private: BTreeSet<String> = std::iter::once("doc".to_string()).collect();
        let public: BTreeSet<String> = std::iter::once("owner".to_string()).collect();
        ProofRequest::new(ProofKind::DataIntegrity, payload, private, public).expect("valid")
    }

    #[test]
    fn transparent_round_trip_verifies() {
        let req = request();
        let witness = Witness::derive(&req).unwrap();
        let artifact = TransparentProver.generate_proof(&req, &witness).unwrap();
        assert!(TransparentVerifier.verify(&artifact).unwrap());
    }

    #[test]
    fn transparent_proof_is_deterministic() {
        let req = request();
        let witness = Witness::derive(&req).unwrap();
        let a = TransparentProver.generate_proof(&req, &witness).unwrap();
        let b = TransparentProver.generate_proof(&req, &witness).unwrap();
        assert_eq!(a.proof_bytes(), b.proof_bytes());
    }

    #[test]
    fn tampered_proof_bytes_do_not_verify() {
        let req = request();
        let witness = Witness::derive(&req).unwrap();
        let good = TransparentProver.generate_proof(&req, &witness).unwrap();
        let mut bad_bytes = good.proof_bytes().to_vec();
        bad_bytes[0] ^= 0x01;
        let bad = ProofArtifact::new(good.digest(), bad_bytes, good.public_signals().to_vec());
        assert!(!TransparentVerifier.verify(&bad).unwrap());
    }

    #[test]
    fn fixed_prover_unavailable() {
        let req = request();
        let witness = Witness::derive(&req).unwrap();
        assert!(matches!(
            FixedProver::unavailable().generate_proof(&req, &witness),
            Err(ProverError::Unavailable(_))
        ));
    }

    #[test]
    fn fixed_verifier_verdicts() {
        let req = request();
        let witness = Witness::derive(&req).unwrap();
        let artifact = TransparentProver.generate_proof(&req, &witness).unwrap();
        assert!(FixedVerifier::accepting().verify(&artifact).unwrap());
        assert!(!FixedVerifier::rejecting().verify(&artifact).unwrap());
        assert!(FixedVerifier::unavailable().verify(&artifact).is_err());
    }
}
