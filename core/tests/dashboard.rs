//! Dashboard controller tests: load/empty-state handling, the
//! recompute cycle, store reactivity, and debounced scheduling.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fraudscope_core::config::EngineConfig;
use fraudscope_core::controller::{DashboardController, KPI_PLACEHOLDER};
use fraudscope_core::insights::{build_cluster_insights, build_fraud_table, InsightsReport};
use fraudscope_core::schedule::DebounceScheduler;
use fraudscope_core::state::{Store, TimeRange};
use fraudscope_core::transaction::{DashboardPayload, DataStatus, Transaction};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn txn(id: &str, user: &str, days_ago: i64, amount: f64, score: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        user_id: user.to_string(),
        timestamp: now() - Duration::days(days_ago),
        amount,
        category: "shopping".into(),
        merchant: "acme".into(),
        country: "USA".into(),
        fraud_score: score,
        rule_based_fraud_flag: false,
        model_fraud_flag: false,
        velocity_flag: false,
    }
}

fn payload(transactions: Vec<Transaction>) -> DashboardPayload {
    DashboardPayload {
        transactions,
        ..DashboardPayload::default()
    }
}

fn controller() -> DashboardController {
    DashboardController::new(EngineConfig::default()).unwrap()
}

/// An empty dataset yields the distinguished no-data state: KPI
/// placeholders, empty tables, nothing throws.
#[test]
fn empty_dataset_renders_placeholders() {
    let mut ctl = controller();
    let status = ctl.load(payload(Vec::new()), now()).unwrap();

    assert_eq!(status, DataStatus::NoData);
    let kpis = ctl.kpis(0);
    assert_eq!(kpis.display_total(), KPI_PLACEHOLDER);
    assert_eq!(kpis.display_spend(), KPI_PLACEHOLDER);
    assert_eq!(kpis.display_open_cases(), KPI_PLACEHOLDER);

    assert_eq!(ctl.txn_table().status_line(), "0 of 0");
    assert!(ctl.heatmap().cells.is_empty());
    assert_eq!(ctl.simulation().flagged_count, 0);
    assert!(ctl.clusters().is_empty());
}

/// KPI flagged count uses the glossary definition: score at/above the
/// threshold OR any detector fired.
#[test]
fn kpi_flagged_count_includes_detector_hits() {
    let mut ctl = controller();
    let mut low_score_flagged = txn("t3", "U2", 1, 30.0, 0.1);
    low_score_flagged.velocity_flag = true;

    ctl.load(
        payload(vec![
            txn("t1", "U1", 1, 100.0, 0.9), // above threshold
            txn("t2", "U1", 1, 50.0, 0.2),  // clean
            low_score_flagged,              // detector only
        ]),
        now(),
    )
    .unwrap();

    let kpis = ctl.kpis(2);
    assert_eq!(kpis.total_transactions, 3);
    assert_eq!(kpis.flagged, 2);
    assert_eq!(kpis.open_cases, 2);
    assert_eq!(kpis.display_flagged(), "2");
    // The simulator counts by score alone.
    assert_eq!(ctl.simulation().flagged_count, 1);
}

/// The rolling time window excludes rows older than the cutoff and a
/// return to "all" restores them.
#[test]
fn time_range_filter_bounds_every_view() {
    let mut ctl = controller();
    ctl.load(
        payload(vec![
            txn("recent", "U1", 2, 100.0, 0.9),
            txn("old", "U1", 40, 900.0, 0.9),
        ]),
        now(),
    )
    .unwrap();

    assert_eq!(ctl.filtered().len(), 2);

    ctl.set_time_range(TimeRange::Last30).unwrap();
    assert_eq!(ctl.filtered().len(), 1);
    assert_eq!(ctl.filtered()[0].id, "recent");
    assert_eq!(ctl.simulation().total, 1);
    assert!((ctl.insights().total_spend - 100.0).abs() < 1e-9);
    assert_eq!(ctl.stats().user("U1").unwrap().count, 1);

    ctl.set_time_range(TimeRange::All).unwrap();
    assert_eq!(ctl.filtered().len(), 2);
}

/// Moving the threshold slider re-runs the sweep on the filtered set.
#[test]
fn threshold_change_reruns_simulation() {
    let mut ctl = controller();
    ctl.load(
        payload(
            (1..=10)
                .map(|i| txn(&format!("t{i}"), "U1", 1, 50.0, i as f64 / 10.0))
                .collect(),
        ),
        now(),
    )
    .unwrap();

    ctl.set_risk_threshold(0.6).unwrap();
    assert_eq!(ctl.simulation().flagged_count, 5);

    ctl.set_risk_threshold(0.8).unwrap();
    assert_eq!(ctl.simulation().flagged_count, 3);
}

/// Unknown transaction ids yield no driver list; known ones are never
/// empty.
#[test]
fn drivers_lookup_degrades_on_unknown_id() {
    let mut ctl = controller();
    ctl.load(payload(vec![txn("t1", "U1", 1, 50.0, 0.2)]), now())
        .unwrap();

    assert!(ctl.drivers_for("ghost").is_none());
    let found = ctl.drivers_for("t1").unwrap();
    assert!(!found.is_empty());
}

// ── Store reactivity ─────────────────────────────────────────────────────────

/// Subscribers observe each write synchronously, in order; an
/// unsubscribed listener stops firing.
#[test]
fn store_notifies_subscribers_in_order() {
    let mut store = Store::new().unwrap();
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let seen_a = Rc::clone(&seen);
    let sub = store.subscribe(Box::new(move |path, value| {
        seen_a.borrow_mut().push(format!("{path}={value}"));
    }));

    store.set("ui.risk_threshold", json!(0.7)).unwrap();
    store.set("ui.advanced_mode", json!(true)).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["ui.risk_threshold=0.7", "ui.advanced_mode=true"]
    );

    store.unsubscribe(sub);
    store.set("theme", json!("dark")).unwrap();
    assert_eq!(seen.borrow().len(), 2);
}

/// get returns None through missing segments; set through a missing
/// parent is a PathNotFound error, not a silent no-op.
#[test]
fn store_path_contract() {
    let mut store = Store::new().unwrap();

    assert!(store.get("ui.risk_threshold").is_some());
    assert!(store.get("ui.nope").is_none());
    assert!(store.get("nope.deeper").is_none());

    let err = store.set("missing.leaf", json!(1)).unwrap_err();
    assert!(err.to_string().contains("missing.leaf"));

    // A new leaf under an existing parent is fine.
    store.set("ui.zoom", json!(2)).unwrap();
    assert_eq!(store.get("ui.zoom"), Some(&json!(2)));
}

/// Typed reads recover the UI snapshot the controller writes through.
#[test]
fn store_typed_read_roundtrip() {
    let mut ctl = controller();
    ctl.load(payload(vec![txn("t1", "U1", 1, 50.0, 0.2)]), now())
        .unwrap();
    ctl.set_risk_threshold(0.75).unwrap();
    ctl.set_time_range(TimeRange::Last7).unwrap();

    let ui = ctl.ui();
    assert!((ui.risk_threshold - 0.75).abs() < 1e-9);
    assert_eq!(ui.time_range, TimeRange::Last7);

    let row_count: usize = ctl.store().read("data.row_count").unwrap();
    assert_eq!(row_count, 1);
}

// ── Insights ─────────────────────────────────────────────────────────────────

/// Report totals, category ordering, and chronological month buckets.
#[test]
fn insights_report_shapes() {
    let mut groceries = txn("t1", "U1", 80, 40.0, 0.1);
    groceries.category = "groceries".into();
    let mut travel = txn("t2", "U2", 10, 300.0, 0.4);
    travel.category = "travel".into();
    let mut more_travel = txn("t3", "U2", 5, 200.0, 0.2);
    more_travel.category = "travel".into();

    let report = InsightsReport::build(&[groceries, travel, more_travel]);
    assert!((report.total_spend - 540.0).abs() < 1e-9);
    assert_eq!(report.top_categories[0].category, "travel");
    assert!((report.top_categories[0].total_spend - 500.0).abs() < 1e-9);

    // Months come out chronologically.
    let months: Vec<&str> = report
        .monthly_trends
        .iter()
        .map(|m| m.month.as_str())
        .collect();
    let mut sorted = months.clone();
    sorted.sort();
    assert_eq!(months, sorted);

    assert_eq!(report.user_summaries.len(), 2);
    let u2 = &report.user_summaries[1];
    assert_eq!(u2.tx_count, 2);
    assert!((u2.avg_transaction - 250.0).abs() < 1e-9);

    // Empty input yields the zeroed report.
    let empty = InsightsReport::build(&[]);
    assert!((empty.total_spend).abs() < f64::EPSILON);
    assert!(empty.user_summaries.is_empty());
}

/// The fraud table keeps flagged rows only, highest score first.
#[test]
fn fraud_table_is_flagged_only_and_sorted() {
    let mut by_flag = txn("flagged", "U1", 1, 10.0, 0.2);
    by_flag.rule_based_fraud_flag = true;
    let rows = build_fraud_table(&[
        txn("clean", "U1", 1, 10.0, 0.2),
        by_flag,
        txn("hot", "U2", 1, 10.0, 0.95),
        txn("warm", "U2", 1, 10.0, 0.6),
    ]);

    let ids: Vec<&str> = rows.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["hot", "warm", "flagged"]);
}

/// Clusters cap at five and scores stay inside [0, 1].
#[test]
fn cluster_insights_capped_and_normalized() {
    let mut txns = Vec::new();
    for (i, cat) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
        let mut t = txn(&format!("t{i}"), &format!("U{i}"), 1, 50.0, 0.1 * (i + 1) as f64);
        t.category = cat.to_string();
        t.velocity_flag = i % 2 == 0;
        txns.push(t);
    }

    let clusters = build_cluster_insights(&txns);
    assert!(!clusters.is_empty());
    assert!(clusters.len() <= 5);
    for c in &clusters {
        assert!((0.0..=1.0).contains(&c.score), "{} out of range", c.name);
    }
    // Strongest first.
    for pair in clusters.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

// ── Debounce scheduler ───────────────────────────────────────────────────────

/// A newer input invalidates the pending token; only the latest fires,
/// and only once its deadline passes.
#[test]
fn debounce_discards_superseded_tokens() {
    let mut sched = DebounceScheduler::with_delay_ms(300);
    let t0 = now();

    let first = sched.schedule(t0);
    assert!(sched.is_current(first));
    // A keystroke 100 ms later supersedes the first token.
    let second = sched.schedule(t0 + Duration::milliseconds(100));
    assert!(!sched.is_current(first));
    assert!(sched.is_current(second));

    // Nothing due before the (rescheduled) deadline.
    assert!(sched.due(t0 + Duration::milliseconds(300)).is_none());
    // The latest token fires exactly once.
    assert_eq!(sched.due(t0 + Duration::milliseconds(400)), Some(second));
    assert!(sched.due(t0 + Duration::milliseconds(500)).is_none());
}
