//! Risk simulator tests: threshold monotonicity, inclusive comparison,
//! and the counterfactual what-if estimator.

use chrono::{TimeZone, Utc};
use fraudscope_core::config::EngineConfig;
use fraudscope_core::simulator::{counterfactual, simulate, MitigationToggles};
use fraudscope_core::stats::StatsIndex;
use fraudscope_core::transaction::Transaction;

fn txn(id: &str, user: &str, amount: f64, country: &str, score: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        user_id: user.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        amount,
        category: "shopping".into(),
        merchant: "acme".into(),
        country: country.to_string(),
        fraud_score: score,
        rule_based_fraud_flag: false,
        model_fraud_flag: false,
        velocity_flag: false,
    }
}

/// Ten scores evenly spaced 0.1–1.0. The comparison is inclusive, so
/// a 0.6 threshold flags five rows (0.6 through 1.0) and raising it to
/// 0.8 drops the count to three — never an increase.
#[test]
fn threshold_slider_sweep() {
    let txns: Vec<Transaction> = (1..=10)
        .map(|i| txn(&format!("t{i}"), "U1", 100.0, "USA", i as f64 / 10.0))
        .collect();

    let at_06 = simulate(&txns, 0.6);
    assert_eq!(at_06.flagged_count, 5);
    assert!((at_06.flag_rate - 0.5).abs() < 1e-9);

    let at_08 = simulate(&txns, 0.8);
    assert_eq!(at_08.flagged_count, 3);

    assert!(at_08.flagged_count <= at_06.flagged_count);
}

/// Flagged count is non-increasing across the whole slider range.
#[test]
fn flagged_count_monotone_in_threshold() {
    let txns: Vec<Transaction> = [0.05, 0.2, 0.33, 0.41, 0.58, 0.6, 0.74, 0.81, 0.93, 1.0]
        .iter()
        .enumerate()
        .map(|(i, &s)| txn(&format!("t{i}"), "U1", 50.0, "USA", s))
        .collect();

    let mut prev = usize::MAX;
    for step in 0..=20 {
        let threshold = step as f64 / 20.0;
        let sim = simulate(&txns, threshold);
        assert!(
            sim.flagged_count <= prev,
            "count rose at threshold {threshold}"
        );
        prev = sim.flagged_count;
    }
}

/// An empty set reports zero flagged and a zero rate, not NaN.
#[test]
fn empty_set_has_zero_rate() {
    let sim = simulate(&[], 0.6);
    assert_eq!(sim.flagged_count, 0);
    assert_eq!(sim.total, 0);
    assert!((sim.flag_rate).abs() < f64::EPSILON);
}

/// Out-of-range thresholds clamp instead of rejecting.
#[test]
fn threshold_clamps_to_unit_interval() {
    let txns = vec![txn("t1", "U1", 10.0, "USA", 0.5)];
    assert_eq!(simulate(&txns, -3.0).flagged_count, 1);
    assert_eq!(simulate(&txns, 7.0).flagged_count, 0);
    assert!((simulate(&txns, 7.0).threshold - 1.0).abs() < f64::EPSILON);
}

/// Ignoring the country-change signal pulls an away-from-home
/// transaction back under the threshold.
#[test]
fn counterfactual_country_toggle() {
    let config = EngineConfig::default();
    let txns = vec![
        txn("t1", "U1", 100.0, "USA", 0.3),
        txn("t2", "U1", 100.0, "USA", 0.3),
        txn("t3", "U1", 100.0, "India", 0.65),
    ];
    let index = StatsIndex::build(&txns);

    let baseline = counterfactual(
        &txns,
        &index,
        0.6,
        MitigationToggles::default(),
        &config.counterfactual,
    );
    assert_eq!(baseline.baseline, 1);
    assert_eq!(baseline.remaining, 1);

    let mitigated = counterfactual(
        &txns,
        &index,
        0.6,
        MitigationToggles {
            ignore_country_change: true,
            cap_amount_fraction: None,
        },
        &config.counterfactual,
    );
    // 0.65 − 0.15 = 0.50 falls below the 0.6 cutoff.
    assert_eq!(mitigated.remaining, 0);
    assert_eq!(mitigated.baseline, 1);
}

/// Capping the amount only helps when the original amount looked
/// unusual and the capped amount no longer would.
#[test]
fn counterfactual_amount_cap_toggle() {
    let config = EngineConfig::default();
    let txns = vec![
        txn("t1", "U1", 100.0, "USA", 0.2),
        txn("t2", "U1", 100.0, "USA", 0.2),
        txn("t3", "U1", 10_000.0, "USA", 0.7),
    ];
    let index = StatsIndex::build(&txns);

    let mitigated = counterfactual(
        &txns,
        &index,
        0.6,
        MitigationToggles {
            ignore_country_change: false,
            cap_amount_fraction: Some(0.5),
        },
        &config.counterfactual,
    );
    // 10000 was beyond two standard deviations; 5000 is not, so the
    // 0.20 offset applies: 0.7 − 0.2 = 0.5 < 0.6.
    assert_eq!(mitigated.baseline, 1);
    assert_eq!(mitigated.remaining, 0);

    // A cap that leaves the amount still unusual changes nothing.
    let unhelpful = counterfactual(
        &txns,
        &index,
        0.6,
        MitigationToggles {
            ignore_country_change: false,
            cap_amount_fraction: Some(0.99),
        },
        &config.counterfactual,
    );
    assert_eq!(unhelpful.remaining, 1);
}
