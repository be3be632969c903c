//! # Proof Stages
//!
//! The ordered stage enum and per-stage status state machine. A stage is
//! atomic from the engine's point of view: there is no partial credit
//! inside a stage, and timing is a measured side effect of completion
//! signals, never a driver of control flow.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// One discrete phase of the proof lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProofStage {
    /// Re-check the request's classification invariant.
    Validation,
    /// Derive the witness commitments from the classified payload.
    WitnessGeneration,
    /// Hand the witness to the prover collaborator.
    ProofGeneration,
    /// Hand the artifact to the verifier collaborator.
    Verification,
}

/// Number of stages in a run.
pub const STAGE_COUNT: usize = ProofStage::ALL.len();

impl ProofStage {
    /// All stages in execution order.
    pub const ALL: [ProofStage; 4] = [
        ProofStage::Validation,
        ProofStage::WitnessGeneration,
        ProofStage::ProofGeneration,
        ProofStage::Verification,
    ];

    /// Position in the execution order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the stage identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::WitnessGeneration => "witness_generation",
            Self::ProofGeneration => "proof_generation",
            Self::Verification => "verification",
        }
    }
}

impl std::fmt::Display for ProofStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage state machine: `Pending → Processing → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageStatus {
    /// Not yet started. Initial.
    Pending,
    /// Currently executing.
    Processing,
    /// Finished successfully. Terminal.
    Completed,
    /// Finished unsuccessfully. Terminal.
    Failed,
}

impl StageStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Status and measured timing for one stage of one run.
#[derive(Debug, Clone, Copy)]
pub struct StageRecord {
    stage: ProofStage,
    status: StageStatus,
    started: Option<Instant>,
    finished: Option<Instant>,
}

impl StageRecord {
    /// A pending record for `stage`.
    pub(crate) fn pending(stage: ProofStage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            started: None,
            finished: None,
        }
    }

    pub(crate) fn begin(&mut self) {
        self.status = StageStatus::Processing;
        self.started = Some(Instant::now());
    }

    pub(crate) fn complete(&mut self) {
        self.status = StageStatus::Completed;
        self.finished = Some(Instant::now());
    }

    pub(crate) fn fail(&mut self) {
        self.status = StageStatus::Failed;
        self.finished = Some(Instant::now());
    }

    /// Which stage this record tracks.
    pub fn stage(&self) -> ProofStage {
        self.stage
    }

    /// Current status.
    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// When the stage began processing, if it has.
    pub fn started_at(&self) -> Option<Instant> {
        self.started
    }

    /// When the stage reached a terminal status, if it has.
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished
    }

    /// Measured execution time. `None` until the stage is terminal.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started, self.finished) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        let all = ProofStage::ALL;
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ProofStage::Verification.index(), STAGE_COUNT - 1);
    }

    #[test]
    fn verification_is_last() {
        assert_eq!(ProofStage::ALL[STAGE_COUNT - 1], ProofStage::Verification);
    }

    #[test]
    fn status_terminality() {
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Processing.is_terminal());
        assert!(StageStatus::Completed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
    }

    #[test]
    fn record_measures_duration() {
        let mut record = StageRecord::pending(ProofStage::Validation);
        assert_eq!(record.duration(), None);
        record.begin();
        assert_eq!(record.status(), StageStatus::Processing);
        assert_eq!(record.duration(), None);
        record.complete();
        assert!(record.duration().is_some());
        assert!(record.finished_at() >= record.started_at());
    }

    #[test]
    fn failed_record_still_has_duration() {
        let mut record = StageRecord::pending(ProofStage::ProofGeneration);
        record.begin();
        record.fail();
        assert_eq!(record.status(), StageStatus::Failed);
        assert!(record.duration().is_some());
    }
}
