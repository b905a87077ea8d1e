//! scope-runner: headless dashboard runner for fraudscope.
//!
//! Usage:
//!   scope-runner --input txns.json --threshold 0.6 --range 30
//!   scope-runner --generate 500 --seed 42 --out txns.json
//!
//! The runner stands in for the browser shell: it loads (or generates)
//! a transaction dataset, drives the dashboard controller through one
//! recompute cycle, and prints the KPI summary, flagged-review table,
//! and anomaly clusters that the UI would render.

use anyhow::Result;
use chrono::{Duration, Utc};
use fraudscope_core::{
    cases::CaseManager,
    config::EngineConfig,
    controller::DashboardController,
    rows::{FlaggedRowRenderer, RowRenderer},
    state::TimeRange,
    store::KvStore,
    transaction::{DashboardPayload, DataStatus, Transaction},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::env;
use std::str::FromStr;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if let Some(count) = opt_arg::<usize>(&args, "--generate") {
        let seed = parse_arg(&args, "--seed", 42u64);
        let out = str_arg(&args, "--out").unwrap_or("txns.json");
        return generate_dataset(count, seed, out);
    }

    let Some(input) = str_arg(&args, "--input") else {
        eprintln!("Usage: scope-runner --input txns.json [--threshold 0.6] [--range all|7|30|90] [--db cases.db]");
        eprintln!("       scope-runner --generate 500 [--seed 42] [--out txns.json]");
        std::process::exit(2);
    };
    let threshold = parse_arg(&args, "--threshold", 0.6f64);
    let range = match str_arg(&args, "--range").unwrap_or("all") {
        "7" => TimeRange::Last7,
        "30" => TimeRange::Last30,
        "90" => TimeRange::Last90,
        _ => TimeRange::All,
    };
    let db = str_arg(&args, "--db").unwrap_or(":memory:");

    let content = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("Cannot read {input}: {e}"))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{input} is not a transaction array: {e}"))?;

    let store = if db == ":memory:" {
        KvStore::in_memory()?
    } else {
        KvStore::open(db)?
    };
    let mut cases = CaseManager::open(store)?;

    let mut controller = DashboardController::new(EngineConfig::default())?;
    let status = controller.load(
        DashboardPayload {
            transactions,
            ..DashboardPayload::default()
        },
        Utc::now(),
    )?;
    if status == DataStatus::NoData {
        println!("No transactions to analyze yet.");
        return Ok(());
    }

    controller.set_risk_threshold(threshold)?;
    controller.set_time_range(range)?;

    // Open a case for every critical-band row, the way an analyst
    // triaging the queue would. Duplicates are silently absorbed.
    let now = Utc::now();
    for row in controller.flagged_table().visible() {
        if row.fraud_score > fraudscope_core::rows::HIGH_RISK_FLOOR {
            cases.add_case(&row, now)?;
        }
    }

    print_summary(&controller, &cases, range);
    Ok(())
}

fn print_summary(controller: &DashboardController, cases: &CaseManager, range: TimeRange) {
    let kpis = controller.kpis(cases.count());
    let sim = controller.simulation();

    println!("fraudscope — dashboard summary ({})", range.label());
    println!("  transactions: {}", kpis.display_total());
    println!("  flagged:      {}", kpis.display_flagged());
    println!("  total spend:  {}", kpis.display_spend());
    println!("  open cases:   {}", kpis.display_open_cases());
    println!(
        "  threshold {:.2} → {} flagged ({:.1}% of {})",
        sim.threshold,
        sim.flagged_count,
        sim.flag_rate * 100.0,
        sim.total
    );
    println!();

    let renderer = FlaggedRowRenderer;
    println!("Flagged for review ({}):", controller.flagged_table().result_len());
    for row in controller.flagged_table().page_rows() {
        let rendered = renderer.render(&row);
        println!("  [{:<8}] {}", rendered.badge, rendered.cells.join("  "));
    }
    println!("  {}", controller.flagged_table().status_line());
    println!();

    if !controller.clusters().is_empty() {
        println!("Anomaly clusters:");
        for cluster in controller.clusters() {
            println!("  {:<30} {:.2}", cluster.name, cluster.score);
        }
        println!();
    }

    println!("Top spend categories:");
    for cat in controller.insights().top_categories.iter().take(5) {
        println!("  {:<16} {:>12.2}", cat.category, cat.total_spend);
    }
}

// ── Synthetic dataset generation ─────────────────────────────────────────────

const CATEGORIES: &[&str] = &[
    "groceries", "travel", "electronics", "dining", "transfer", "entertainment",
];
const MERCHANTS: &[&str] = &[
    "acme", "globex", "initech", "umbrella", "wayne", "stark", "soylent",
];
const COUNTRIES: &[&str] = &["USA", "UK", "India", "Germany", "Brazil", "Japan"];

/// Write a seeded, deterministic transaction dataset the runner (and
/// the upload flow it stands in for) can load back.
fn generate_dataset(count: usize, seed: u64, out: &str) -> Result<()> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let now = Utc::now();
    let users: Vec<String> = (1..=count.div_ceil(20).max(3))
        .map(|i| format!("U{i:03}"))
        .collect();

    let mut transactions = Vec::with_capacity(count);
    for _ in 0..count {
        let user = users[rng.gen_range(0..users.len())].clone();
        // Heavy-tailed amounts: mostly small, occasionally large.
        let amount = if rng.gen_bool(0.05) {
            rng.gen_range(2_000.0..20_000.0)
        } else {
            rng.gen_range(5.0..400.0)
        };
        let score: f64 = if rng.gen_bool(0.1) {
            rng.gen_range(0.6..1.0)
        } else {
            rng.gen_range(0.0..0.5)
        };

        transactions.push(Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user,
            timestamp: now - Duration::minutes(rng.gen_range(0..90 * 24 * 60)),
            amount,
            category: CATEGORIES[rng.gen_range(0..CATEGORIES.len())].into(),
            merchant: MERCHANTS[rng.gen_range(0..MERCHANTS.len())].into(),
            country: COUNTRIES[rng.gen_range(0..COUNTRIES.len())].into(),
            fraud_score: score,
            rule_based_fraud_flag: amount > 2_000.0 && rng.gen_bool(0.6),
            model_fraud_flag: score > 0.6,
            velocity_flag: rng.gen_bool(0.05),
        });
    }

    std::fs::write(out, serde_json::to_string_pretty(&transactions)?)?;
    println!("Wrote {count} transactions to {out} (seed {seed})");
    Ok(())
}

// ── Arg parsing helpers ──────────────────────────────────────────────────────

fn parse_arg<T: FromStr + Copy>(args: &[String], name: &str, default: T) -> T {
    opt_arg(args, name).unwrap_or(default)
}

fn opt_arg<T: FromStr>(args: &[String], name: &str) -> Option<T> {
    args.windows(2)
        .find(|w| w[0] == name)
        .and_then(|w| w[1].parse().ok())
}

fn str_arg<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}
