/// Structured outcome reporting.
///
/// The engines report every per-record outcome through this seam instead of
/// relying on a process-wide logger, so tests assert on structured records
/// rather than captured log text. The default implementation forwards to
/// `tracing`; tests use the in-memory collector.
use std::sync::Mutex;

use tracing::{info, warn};

/// One structured per-record or per-phase outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Anchored {
        file: String,
        fingerprint: String,
        tx_id: String,
    },
    AnchorFailed {
        file: String,
        error: String,
    },
    /// Dedup pre-check found an existing exact anchor; nothing was minted.
    AnchorSkipped {
        file: String,
        existing_tx: String,
    },
    Verified {
        file: String,
    },
    Mismatched {
        file: String,
    },
    /// A whole phase was skipped because a collaborator was unavailable.
    PhaseSkipped {
        phase: &'static str,
        reason: String,
    },
}

pub trait Reporter: Send + Sync {
    fn record(&self, outcome: Outcome);
}

/// Forwards outcomes to `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, outcome: Outcome) {
        match &outcome {
            Outcome::Anchored {
                file,
                fingerprint,
                tx_id,
            } => info!(file = %file, fingerprint = %fingerprint, tx_id = %tx_id, "Anchored"),
            Outcome::AnchorFailed { file, error } => {
                warn!(file = %file, error = %error, "Anchor failed");
            }
            Outcome::AnchorSkipped { file, existing_tx } => {
                info!(file = %file, existing_tx = %existing_tx, "Already anchored, skipped");
            }
            Outcome::Verified { file } => info!(file = %file, "Verified"),
            Outcome::Mismatched { file } => warn!(file = %file, "Mismatched"),
            Outcome::PhaseSkipped { phase, reason } => {
                warn!(phase = %phase, reason = %reason, "Phase skipped");
            }
        }
    }
}

/// Collects outcomes in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    outcomes: Mutex<Vec<Outcome>>,
}

impl MemoryReporter {
    pub fn take(&self) -> Vec<Outcome> {
        std::mem::take(&mut self.outcomes.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome);
    }
}
