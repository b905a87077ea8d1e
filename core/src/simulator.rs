//! Threshold sweep and counterfactual what-if estimates.
//!
//! `simulate` is a pure function from the slider position to derived
//! counts — safe to re-run on every input event. The counterfactual
//! estimator applies fixed heuristic score offsets; it illustrates a
//! mitigation, it does not re-run the backend's scoring model.

use crate::config::CounterfactualOffsets;
use crate::stats::{StatsIndex, AMOUNT_SIGMA};
use crate::transaction::Transaction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSimulation {
    pub threshold: f64,
    pub flagged_count: usize,
    /// flagged / total; 0 when the set is empty.
    pub flag_rate: f64,
    pub total: usize,
}

/// Count of transactions scoring at or above the threshold, plus the
/// resulting rate. Non-increasing in the threshold for a fixed set.
pub fn simulate(transactions: &[Transaction], threshold: f64) -> ThresholdSimulation {
    let threshold = threshold.clamp(0.0, 1.0);
    let total = transactions.len();
    let flagged_count = transactions
        .iter()
        .filter(|t| t.fraud_score >= threshold)
        .count();
    let flag_rate = if total == 0 {
        0.0
    } else {
        flagged_count as f64 / total as f64
    };
    ThresholdSimulation {
        threshold,
        flagged_count,
        flag_rate,
        total,
    }
}

/// Hypothetical mitigations an analyst can toggle on the detail panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MitigationToggles {
    /// Pretend the transaction happened in the user's usual country.
    pub ignore_country_change: bool,
    /// Pretend the amount were reduced to this fraction of the
    /// original (None leaves amounts untouched).
    pub cap_amount_fraction: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CounterfactualEstimate {
    /// Rows still at or above the threshold under the hypothesis.
    pub remaining: usize,
    /// Rows at or above the threshold with no mitigation applied.
    pub baseline: usize,
}

/// How many transactions would stay above the current global threshold
/// if the toggled mitigations held. Effective scores floor at zero.
pub fn counterfactual(
    transactions: &[Transaction],
    index: &StatsIndex,
    threshold: f64,
    toggles: MitigationToggles,
    offsets: &CounterfactualOffsets,
) -> CounterfactualEstimate {
    let threshold = threshold.clamp(0.0, 1.0);
    let baseline = transactions
        .iter()
        .filter(|t| t.fraud_score >= threshold)
        .count();

    let remaining = transactions
        .iter()
        .filter(|t| effective_score(t, index, toggles, offsets) >= threshold)
        .count();

    CounterfactualEstimate {
        remaining,
        baseline,
    }
}

fn effective_score(
    t: &Transaction,
    index: &StatsIndex,
    toggles: MitigationToggles,
    offsets: &CounterfactualOffsets,
) -> f64 {
    let mut score = t.fraud_score;
    let user = index.user(&t.user_id);

    if toggles.ignore_country_change {
        let away_from_home = user
            .and_then(|agg| agg.top_country())
            .is_some_and(|top| t.country != top);
        if away_from_home {
            score -= offsets.country_change;
        }
    }

    if let Some(fraction) = toggles.cap_amount_fraction {
        // The cap only helps when the original amount looked unusual
        // and the capped amount no longer would.
        if let Some(agg) = user {
            let std_dev = agg.std_dev();
            let capped = t.amount * fraction.clamp(0.0, 1.0);
            if std_dev > 0.0
                && t.amount > AMOUNT_SIGMA * std_dev
                && capped <= AMOUNT_SIGMA * std_dev
            {
                score -= offsets.amount_cap;
            }
        }
    }

    score.max(0.0)
}
