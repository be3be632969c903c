//! # veil-proof — Proof Lifecycle Engine
//!
//! Models the multi-stage process of producing and verifying a
//! zero-knowledge-style proof artifact:
//!
//! ```text
//! Validation → WitnessGeneration → ProofGeneration → Verification
//! ```
//!
//! ## Architecture
//!
//! - **Request model** (`request.rs`): `ProofRequest` with total, disjoint
//!   classification of payload fields into private and public sets,
//!   enforced at construction.
//! - **Artifact model** (`artifact.rs`): the `Witness` derived from a
//!   request and the immutable `ProofArtifact` returned by the prover.
//! - **Backends** (`backend.rs`): the `Prover`/`Verifier` collaborator
//!   traits, a transparent SHA-256-based backend, and fixed test doubles
//!   with configurable outcome and latency so timing tests are
//!   reproducible.
//! - **Stages** (`stage.rs`): the ordered stage enum and per-stage status
//!   state machine with measured durations.
//! - **Engine** (`engine.rs`): drives one run at a time through the stages
//!   on a tokio task, publishes progress snapshots, enforces per-stage
//!   timeouts, honors cancellation at stage boundaries, and retains a
//!   bounded most-recent-first history.
//!
//! This crate defines the lifecycle and data shapes around a proof; the
//! cryptographic proving system itself is the collaborator behind the
//! `Prover`/`Verifier` traits.
//!
//! ## Crate Policy
//!
//! - Depends only on `veil-core` internally.
//! - No `unsafe`; no `unwrap()`/`expect()` outside tests.

pub mod artifact;
pub mod backend;
pub mod engine;
pub mod request;
pub mod stage;

pub use artifact::{ProofArtifact, Witness};
pub use backend::{
    FixedProver, FixedVerifier, Prover, ProverError, TransparentProver, TransparentVerifier,
    Verifier, VerifierError,
};
pub use engine::{
    EngineConfig, EngineError, FailureReason, ProofLifecycleEngine, RunHandle, RunReport,
    RunSnapshot, RunStatus,
};
pub use request::{ProofKind, ProofRequest, RequestError};
pub use stage::{ProofStage, StageRecord, StageStatus, STAGE_COUNT};
