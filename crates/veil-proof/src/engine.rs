//! # ProofLifecycleEngine — Staged Run Execution
//!
//! Drives one [`ProofRun`](RunSnapshot) from submission to terminal state:
//! stages execute strictly sequentially on a spawned tokio task, each
//! transition publishes an observable snapshot, and collaborator calls run
//! on a blocking thread bounded by the configured stage timeout.
//!
//! ## Admission Control
//!
//! At most one run is active per engine at a time. Interleaved runs would
//! corrupt the per-run duration accounting, so a second `start` while one
//! is in flight fails with [`EngineError::RunInProgress`] instead of
//! queuing.
//!
//! ## Cancellation
//!
//! The cancel flag is checked at every stage boundary. An in-flight stage
//! is allowed to finish; the run then stops and lands in `Failed` with
//! reason [`FailureReason::Cancelled`], distinct from any other failure.
//!
//! ## Timeouts
//!
//! When a collaborator call exceeds the stage timeout, the stage fails
//! with reason [`FailureReason::Timeout`] and the run terminates, but the
//! blocking thread itself cannot be interrupted: it runs to completion
//! detached and its result is discarded. A long orphaned call may still
//! be executing while the next admitted run starts; it cannot touch that
//! run's records.
//!
//! ## History
//!
//! Terminal runs — verified, failed, and cancelled alike — are appended to
//! a bounded most-recent-first history. Capacity 0 disables retention.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use veil_core::Timestamp;

use crate::artifact::{ProofArtifact, Witness};
use crate::backend::{Prover, ProverError, Verifier, VerifierError};
use crate::request::{ProofKind, ProofRequest};
use crate::stage::{ProofStage, StageRecord, StageStatus, STAGE_COUNT};

/// Overall status of a proof run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RunStatus {
    /// Some stage before Verification is not yet completed.
    Generating,
    /// Verification is processing.
    Verifying,
    /// Every stage completed. Terminal.
    Verified,
    /// A stage failed or the run was cancelled. Terminal.
    Failed,
}

impl RunStatus {
    /// Whether the run admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }
}

/// Why a run failed. Every `Failed` run carries exactly one reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FailureReason {
    /// The request violated the classification invariant. Caller bug.
    InvalidRequest,
    /// The prover collaborator was unreachable. Retryable.
    ProverUnavailable,
    /// The verifier collaborator was unreachable. Retryable.
    VerifierUnavailable,
    /// A stage exceeded the configured timeout. Retryable.
    Timeout,
    /// The run was cancelled between stages. Not an application error.
    Cancelled,
    /// The verifier examined the proof and rejected it.
    Invalid,
}

impl FailureReason {
    /// Whether retrying the whole run may succeed. Stage state is not
    /// resumable mid-flight, so retry always means a fresh run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProverUnavailable | Self::VerifierUnavailable | Self::Timeout
        )
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many terminal runs to retain, most recent first. 0 disables
    /// history.
    pub history_capacity: usize,
    /// Upper bound on each collaborator call. Must be positive; a stage
    /// that exceeds it fails with reason [`FailureReason::Timeout`].
    pub stage_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            stage_timeout: Duration::from_secs(30),
        }
    }
}

/// Error from engine construction, admission, or supervision.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine configuration is invalid.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// A run is already active; interleaving is refused by design.
    #[error("a proof run is already in progress")]
    RunInProgress,

    /// The run task ended without reporting a result.
    #[error("proof run ended without reporting a result")]
    RunAborted,
}

/// Observable state of a run at some transition.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    run_id: Uuid,
    kind: ProofKind,
    status: RunStatus,
    stages: [StageStatus; STAGE_COUNT],
    failure: Option<FailureReason>,
}

impl RunSnapshot {
    /// Handle of the run this snapshot describes.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// What the run is proving.
    pub fn kind(&self) -> ProofKind {
        self.kind
    }

    /// Overall run status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Status of one stage.
    pub fn stage_status(&self, stage: ProofStage) -> StageStatus {
        self.stages[stage.index()]
    }

    /// Failure reason, once the run has failed.
    pub fn failure(&self) -> Option<FailureReason> {
        self.failure
    }

    /// Completed stages over total stages, in `0..=1`. Monotonically
    /// non-decreasing over the life of a run.
    pub fn progress(&self) -> f64 {
        let completed = self
            .stages
            .iter()
            .filter(|s| **s == StageStatus::Completed)
            .count();
        completed as f64 / STAGE_COUNT as f64
    }
}

/// Terminal report for one run. Only exists once the run is terminal, so
/// the total verification time is never a misleading partial sum.
#[derive(Debug, Clone)]
pub struct RunReport {
    run_id: Uuid,
    kind: ProofKind,
    status: RunStatus,
    failure: Option<FailureReason>,
    stages: [StageRecord; STAGE_COUNT],
    artifact: Option<ProofArtifact>,
    verification_time: Duration,
    finished_at: Timestamp,
}

impl RunReport {
    /// Handle of the run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// What the run was proving.
    pub fn kind(&self) -> ProofKind {
        self.kind
    }

    /// Terminal status: `Verified` or `Failed`.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Why the run failed, if it did.
    pub fn failure(&self) -> Option<FailureReason> {
        self.failure
    }

    /// Per-stage records in execution order.
    pub fn stages(&self) -> &[StageRecord; STAGE_COUNT] {
        &self.stages
    }

    /// Record for one stage.
    pub fn stage(&self, stage: ProofStage) -> &StageRecord {
        &self.stages[stage.index()]
    }

    /// The artifact the prover produced, if the run got that far.
    pub fn artifact(&self) -> Option<&ProofArtifact> {
        self.artifact.as_ref()
    }

    /// Sum of all measured stage durations.
    pub fn verification_time(&self) -> Duration {
        self.verification_time
    }

    /// When the run reached its terminal state.
    pub fn finished_at(&self) -> Timestamp {
        self.finished_at
    }
}

/// Caller-side handle to an in-flight run.
///
/// The caller that initiated the run owns this handle for the run's whole
/// lifetime; once terminal, the run detaches from the engine's active slot
/// and lives on only in history.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    cancel: Arc<AtomicBool>,
    snapshot_rx: watch::Receiver<RunSnapshot>,
    done_rx: oneshot::Receiver<RunReport>,
}

impl RunHandle {
    /// Handle of the run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Request cancellation. Takes effect at the next stage boundary; the
    /// in-flight stage finishes first.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> RunSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Completed stages over total stages, in `0..=1`.
    pub fn progress(&self) -> f64 {
        self.snapshot().progress()
    }

    /// A receiver that observes every stage transition.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait for the run to reach a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunAborted`] if the run task ended without
    /// reporting (a panic inside the engine itself).
    pub async fn wait(self) -> Result<RunReport, EngineError> {
        self.done_rx.await.map_err(|_| EngineError::RunAborted)
    }
}

struct EngineShared {
    active: AtomicBool,
    history_capacity: usize,
    history: Mutex<VecDeque<RunReport>>,
}

impl EngineShared {
    fn record(&self, report: RunReport) {
        if self.history_capacity == 0 {
            return;
        }
        let mut history = self.history.lock();
        history.push_front(report);
        history.truncate(self.history_capacity);
    }
}

/// Drives proof runs through their stages. One instance per caller
/// session; constructed at application start and shared by handle.
pub struct ProofLifecycleEngine {
    prover: Arc<dyn Prover>,
    verifier: Arc<dyn Verifier>,
    config: EngineConfig,
    shared: Arc<EngineShared>,
}

impl ProofLifecycleEngine {
    /// Create an engine over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `stage_timeout` is zero;
    /// a zero bound would fail every collaborator stage with `Timeout`.
    pub fn new(
        prover: Arc<dyn Prover>,
        verifier: Arc<dyn Verifier>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if config.stage_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "stage_timeout must be positive".to_string(),
            ));
        }
        let shared = Arc::new(EngineShared {
            active: AtomicBool::new(false),
            history_capacity: config.history_capacity,
            history: Mutex::new(VecDeque::new()),
        });
        Ok(Self {
            prover,
            verifier,
            config,
            shared,
        })
    }

    /// Whether a run is currently active.
    pub fn is_busy(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Terminal runs, most recent first, bounded by the configured
    /// capacity.
    pub fn history(&self) -> Vec<RunReport> {
        self.shared.history.lock().iter().cloned().collect()
    }

    /// Begin executing a run. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunInProgress`] if a run is already active.
    pub fn start(&self, request: ProofRequest) -> Result<RunHandle, EngineError> {
        if self
            .shared
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::RunInProgress);
        }

        let run_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker = RunWorker::new(
            run_id,
            request,
            Arc::clone(&self.prover),
            Arc::clone(&self.verifier),
            self.config.stage_timeout,
            Arc::clone(&cancel),
        );
        let snapshot_rx = worker.snapshot_rx();
        let (done_tx, done_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);

        info!(%run_id, kind = %worker.kind(), "proof run started");
        tokio::spawn(async move {
            let report = worker.execute().await;
            shared.record(report.clone());
            shared.active.store(false, Ordering::SeqCst);
            let _ = done_tx.send(report);
        });

        Ok(RunHandle {
            run_id,
            cancel,
            snapshot_rx,
            done_rx,
        })
    }
}

impl std::fmt::Debug for ProofLifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofLifecycleEngine")
            .field("config", &self.config)
            .field("busy", &self.is_busy())
            .finish()
    }
}

/// Executes one run on its own task.
struct RunWorker {
    run_id: Uuid,
    request: Arc<ProofRequest>,
    prover: Arc<dyn Prover>,
    verifier: Arc<dyn Verifier>,
    stage_timeout: Duration,
    cancel: Arc<AtomicBool>,
    snapshot_tx: watch::Sender<RunSnapshot>,
    snapshot_rx: watch::Receiver<RunSnapshot>,
    records: [StageRecord; STAGE_COUNT],
    status: RunStatus,
    failure: Option<FailureReason>,
    artifact: Option<ProofArtifact>,
}

impl RunWorker {
    fn new(
        run_id: Uuid,
        request: ProofRequest,
        prover: Arc<dyn Prover>,
        verifier: Arc<dyn Verifier>,
        stage_timeout: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let kind = request.kind();
        let records = [
            StageRecord::pending(ProofStage::Validation),
            StageRecord::pending(ProofStage::WitnessGeneration),
            StageRecord::pending(ProofStage::ProofGeneration),
            StageRecord::pending(ProofStage::Verification),
        ];
        let initial = RunSnapshot {
            run_id,
            kind,
            status: RunStatus::Generating,
            stages: [StageStatus::Pending; STAGE_COUNT],
            failure: None,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        Self {
            run_id,
            request: Arc::new(request),
            prover,
            verifier,
            stage_timeout,
            cancel,
            snapshot_tx,
            snapshot_rx,
            records,
            status: RunStatus::Generating,
            failure: None,
            artifact: None,
        }
    }

    fn kind(&self) -> ProofKind {
        self.request.kind()
    }

    fn snapshot_rx(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshot_rx.clone()
    }

    fn publish(&self) {
        let mut stages = [StageStatus::Pending; STAGE_COUNT];
        for (slot, record) in stages.iter_mut().zip(self.records.iter()) {
            *slot = record.status();
        }
        let _ = self.snapshot_tx.send(RunSnapshot {
            run_id: self.run_id,
            kind: self.kind(),
            status: self.status,
            stages,
            failure: self.failure,
        });
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn mark_processing(&mut self, stage: ProofStage) {
        self.records[stage.index()].begin();
        if stage == ProofStage::Verification {
            self.status = RunStatus::Verifying;
        }
        debug!(run_id = %self.run_id, %stage, "stage processing");
        self.publish();
    }

    fn mark_completed(&mut self, stage: ProofStage) {
        self.records[stage.index()].complete();
        if stage == ProofStage::Verification {
            self.status = RunStatus::Verified;
        }
        debug!(run_id = %self.run_id, %stage, "stage completed");
        self.publish();
    }

    fn mark_failed(&mut self, stage: ProofStage, reason: FailureReason) {
        self.records[stage.index()].fail();
        self.status = RunStatus::Failed;
        self.failure = Some(reason);
        warn!(run_id = %self.run_id, %stage, ?reason, "stage failed");
        self.publish();
    }

    /// Stop at a boundary without starting the next stage.
    fn mark_cancelled(&mut self) {
        self.status = RunStatus::Failed;
        self.failure = Some(FailureReason::Cancelled);
        info!(run_id = %self.run_id, "run cancelled at stage boundary");
        self.publish();
    }

    fn finish(self) -> RunReport {
        let verification_time: Duration = self
            .records
            .iter()
            .filter_map(StageRecord::duration)
            .sum();
        info!(
            run_id = %self.run_id,
            status = ?self.status,
            elapsed_ms = verification_time.as_millis() as u64,
            "proof run finished"
        );
        RunReport {
            run_id: self.run_id,
            kind: self.request.kind(),
            status: self.status,
            failure: self.failure,
            stages: self.records,
            artifact: self.artifact,
            verification_time,
            finished_at: Timestamp::now(),
        }
    }

    async fn execute(mut self) -> RunReport {
        // Validation: hold deserialized requests to the constructor's rule.
        self.mark_processing(ProofStage::Validation);
        if let Err(err) = self.request.validate() {
            warn!(run_id = %self.run_id, %err, "request rejected");
            self.mark_failed(ProofStage::Validation, FailureReason::InvalidRequest);
            return self.finish();
        }
        self.mark_completed(ProofStage::Validation);
        if self.cancelled() {
            self.mark_cancelled();
            return self.finish();
        }

        // Witness generation: commitments over the classified payload.
        self.mark_processing(ProofStage::WitnessGeneration);
        let witness = match Witness::derive(&self.request) {
            Ok(witness) => {
                self.mark_completed(ProofStage::WitnessGeneration);
                witness
            }
            Err(err) => {
                warn!(run_id = %self.run_id, %err, "witness derivation failed");
                self.mark_failed(ProofStage::WitnessGeneration, FailureReason::InvalidRequest);
                return self.finish();
            }
        };
        if self.cancelled() {
            self.mark_cancelled();
            return self.finish();
        }

        // Proof generation: bounded call into the prover collaborator.
        self.mark_processing(ProofStage::ProofGeneration);
        let prover = Arc::clone(&self.prover);
        let request = Arc::clone(&self.request);
        let witness_for_prover = witness.clone();
        let outcome = tokio::time::timeout(
            self.stage_timeout,
            tokio::task::spawn_blocking(move || {
                prover.generate_proof(&request, &witness_for_prover)
            }),
        )
        .await;
        let artifact = match flatten_prover_outcome(outcome) {
            Ok(artifact) => {
                self.artifact = Some(artifact.clone());
                self.mark_completed(ProofStage::ProofGeneration);
                artifact
            }
            Err(reason) => {
                self.mark_failed(ProofStage::ProofGeneration, reason);
                return self.finish();
            }
        };
        if self.cancelled() {
            self.mark_cancelled();
            return self.finish();
        }

        // Verification: bounded call into the verifier collaborator.
        self.mark_processing(ProofStage::Verification);
        let verifier = Arc::clone(&self.verifier);
        let artifact_for_verifier = artifact.clone();
        let outcome = tokio::time::timeout(
            self.stage_timeout,
            tokio::task::spawn_blocking(move || verifier.verify(&artifact_for_verifier)),
        )
        .await;
        match flatten_verifier_outcome(outcome) {
            Ok(true) => self.mark_completed(ProofStage::Verification),
            Ok(false) => self.mark_failed(ProofStage::Verification, FailureReason::Invalid),
            Err(reason) => self.mark_failed(ProofStage::Verification, reason),
        }
        self.finish()
    }
}

type BoundedOutcome<T> = Result<Result<T, JoinError>, tokio::time::error::Elapsed>;

fn flatten_prover_outcome(
    outcome: BoundedOutcome<Result<ProofArtifact, ProverError>>,
) -> Result<ProofArtifact, FailureReason> {
    match outcome {
        Err(_) => Err(FailureReason::Timeout),
        Ok(Err(_)) => Err(FailureReason::ProverUnavailable),
        Ok(Ok(Err(ProverError::Unavailable(_)))) => Err(FailureReason::ProverUnavailable),
        Ok(Ok(Err(ProverError::InvalidRequest(_)))) => Err(FailureReason::InvalidRequest),
        Ok(Ok(Ok(artifact))) => Ok(artifact),
    }
}

fn flatten_verifier_outcome(
    outcome: BoundedOutcome<Result<bool, VerifierError>>,
) -> Result<bool, FailureReason> {
    match outcome {
        Err(_) => Err(FailureReason::Timeout),
        Ok(Err(_)) => Err(FailureReason::VerifierUnavailable),
        Ok(Ok(Err(VerifierError::Unavailable(_)))) => Err(FailureReason::VerifierUnavailable),
        Ok(Ok(Ok(valid))) => Ok(valid),
    }
}
