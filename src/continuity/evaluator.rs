//! Power-Cycle Continuity Evaluator
//!
//! Compares the power-cycle counters of two successive samples of the same
//! drive. A drive that was not restarted, or restarted exactly once, is
//! consistent; anything else means it was powered elsewhere, swapped, or
//! lost power more than once between samples.

use crate::domain::ports::NormalizedSample;
use serde::{Deserialize, Serialize};

// =============================================================================
// Verdict Types
// =============================================================================

/// Outcome class of a continuity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Ok,
    Tampered,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Ok => write!(f, "OK"),
            Classification::Tampered => write!(f, "TAMPERED"),
        }
    }
}

/// Which rule produced the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    /// No power cycle since the previous sample
    Unchanged,
    /// Exactly one power cycle since the previous sample
    SingleRestart,
    /// More than one power cycle since the previous sample
    MultipleRestarts,
    /// The counter moved backwards (reset, rollover or a different drive)
    CounterRegression,
}

/// How a backwards-moving power-cycle counter is classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegressionPolicy {
    /// Treat any regression as tampering
    #[default]
    Tampered,
    /// Accept regressions as counter resets
    Tolerate,
}

/// Result of comparing two samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityVerdict {
    pub classification: Classification,
    pub reason: VerdictReason,
    pub previous: u64,
    pub current: u64,
}

impl ContinuityVerdict {
    pub fn is_tampered(&self) -> bool {
        self.classification == Classification::Tampered
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Classify the transition from `previous` to `current` (the newer sample)
pub fn evaluate(
    previous: &NormalizedSample,
    current: &NormalizedSample,
    policy: RegressionPolicy,
) -> ContinuityVerdict {
    evaluate_counts(previous.power_cycle_count, current.power_cycle_count, policy)
}

/// Classify a pair of power-cycle counters
pub fn evaluate_counts(prev: u64, actual: u64, policy: RegressionPolicy) -> ContinuityVerdict {
    let reason = if prev == actual {
        VerdictReason::Unchanged
    } else if prev.checked_add(1) == Some(actual) {
        VerdictReason::SingleRestart
    } else if actual < prev {
        VerdictReason::CounterRegression
    } else {
        VerdictReason::MultipleRestarts
    };

    let classification = match (reason, policy) {
        (VerdictReason::Unchanged | VerdictReason::SingleRestart, _) => Classification::Ok,
        (VerdictReason::CounterRegression, RegressionPolicy::Tolerate) => Classification::Ok,
        _ => Classification::Tampered,
    };

    ContinuityVerdict {
        classification,
        reason,
        previous: prev,
        current: actual,
    }
}
