//! Single-pass aggregation over the time-range-filtered transaction set.
//!
//! This module:
//!   1. Builds per-user and per-country rollups in one O(n) pass
//!   2. Derives qualitative risk drivers per transaction
//!   3. Serves the side-by-side user comparator
//!   4. Builds the category × country risk heatmap
//!
//! The index is rebuilt in full on every filter change — no incremental
//! update. The dataset is bounded at a few thousand rows, so the pass
//! stays well inside one frame.

use crate::rows::HIGH_RISK_FLOOR;
use crate::transaction::Transaction;
use crate::types::UserId;
use serde::Serialize;
use std::collections::HashMap;

/// Standard-deviation multiple above which an amount reads as unusual.
pub const AMOUNT_SIGMA: f64 = 2.0;

// ── Aggregates ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAggregate {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    pub risk_sum: f64,
    /// Country → transaction count, in first-seen order.
    pub country_freq: Vec<(String, u64)>,
}

impl UserAggregate {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Population variance, clamped at zero: sum_sq/count − mean² can
    /// dip slightly negative under floating-point error.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn avg_risk(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.risk_sum / self.count as f64
        }
    }

    /// The user's single most frequent country. Ties keep the country
    /// seen first.
    pub fn top_country(&self) -> Option<&str> {
        let mut best: Option<(&str, u64)> = None;
        for (country, count) in &self.country_freq {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((country, *count)),
            }
        }
        best.map(|(country, _)| country)
    }

    fn record(&mut self, t: &Transaction) {
        self.count += 1;
        self.sum += t.amount;
        self.sum_sq += t.amount * t.amount;
        self.risk_sum += t.fraud_score;
        match self.country_freq.iter_mut().find(|(c, _)| c == &t.country) {
            Some((_, n)) => *n += 1,
            None => self.country_freq.push((t.country.clone(), 1)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountryAggregate {
    pub count: u64,
    pub risk_sum: f64,
}

impl CountryAggregate {
    pub fn mean_risk(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.risk_sum / self.count as f64
        }
    }
}

/// Per-user and per-country rollups plus first-seen key ordering, so
/// every consumer iterates deterministically.
#[derive(Debug, Clone, Default)]
pub struct StatsIndex {
    users: HashMap<UserId, UserAggregate>,
    user_order: Vec<UserId>,
    countries: HashMap<String, CountryAggregate>,
    country_order: Vec<String>,
}

impl StatsIndex {
    /// One linear pass over the filtered set.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut users: HashMap<UserId, UserAggregate> = HashMap::new();
        let mut user_order: Vec<UserId> = Vec::new();
        let mut countries: HashMap<String, CountryAggregate> = HashMap::new();
        let mut country_order: Vec<String> = Vec::new();

        for t in transactions {
            if !users.contains_key(&t.user_id) {
                user_order.push(t.user_id.clone());
            }
            users.entry(t.user_id.clone()).or_default().record(t);

            if !countries.contains_key(&t.country) {
                country_order.push(t.country.clone());
            }
            let country = countries.entry(t.country.clone()).or_default();
            country.count += 1;
            country.risk_sum += t.fraud_score;
        }

        Self {
            users,
            user_order,
            countries,
            country_order,
        }
    }

    pub fn user(&self, id: &str) -> Option<&UserAggregate> {
        self.users.get(id)
    }

    pub fn country(&self, label: &str) -> Option<&CountryAggregate> {
        self.countries.get(label)
    }

    pub fn users(&self) -> impl Iterator<Item = (&UserId, &UserAggregate)> {
        self.user_order
            .iter()
            .filter_map(|id| self.users.get(id).map(|agg| (id, agg)))
    }

    pub fn countries(&self) -> impl Iterator<Item = (&String, &CountryAggregate)> {
        self.country_order
            .iter()
            .filter_map(|c| self.countries.get(c).map(|agg| (c, agg)))
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

// ── Explainability ───────────────────────────────────────────────────────────

/// A qualitative reason a transaction looks anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    RuleDetector,
    ModelDetector,
    VelocityDetector,
    HighScore,
    UnusualAmount,
    CountryMismatch,
    NoDominantDriver,
}

impl Driver {
    pub fn label(self) -> &'static str {
        match self {
            Driver::RuleDetector => "Rule-based detector fired",
            Driver::ModelDetector => "Model detector fired",
            Driver::VelocityDetector => "Velocity detector fired",
            Driver::HighScore => "High risk score",
            Driver::UnusualAmount => "Unusually large amount",
            Driver::CountryMismatch => "Country differs from usual",
            Driver::NoDominantDriver => "No dominant driver",
        }
    }
}

/// Ordered driver list for one transaction, given its owner's rollup.
/// Never empty: with nothing to report it holds the single placeholder.
pub fn drivers(t: &Transaction, user: &UserAggregate) -> Vec<Driver> {
    let mut out = Vec::new();
    if t.rule_based_fraud_flag {
        out.push(Driver::RuleDetector);
    }
    if t.model_fraud_flag {
        out.push(Driver::ModelDetector);
    }
    if t.velocity_flag {
        out.push(Driver::VelocityDetector);
    }
    if t.fraud_score > HIGH_RISK_FLOOR {
        out.push(Driver::HighScore);
    }
    let std_dev = user.std_dev();
    if std_dev > 0.0 && t.amount > AMOUNT_SIGMA * std_dev {
        out.push(Driver::UnusualAmount);
    }
    if let Some(top) = user.top_country() {
        if t.country != top {
            out.push(Driver::CountryMismatch);
        }
    }
    if out.is_empty() {
        out.push(Driver::NoDominantDriver);
    }
    out
}

// ── Comparator ───────────────────────────────────────────────────────────────

/// One side of the side-by-side user comparison. Unknown users yield a
/// zeroed side rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserComparison {
    pub user_id: UserId,
    pub total_spend: f64,
    pub avg_spend: f64,
    pub tx_count: u64,
    pub avg_risk: f64,
}

impl UserComparison {
    fn from_index(index: &StatsIndex, id: &str) -> Self {
        match index.user(id) {
            Some(agg) => Self {
                user_id: id.to_string(),
                total_spend: agg.sum,
                avg_spend: agg.mean(),
                tx_count: agg.count,
                avg_risk: agg.avg_risk(),
            },
            None => Self {
                user_id: id.to_string(),
                total_spend: 0.0,
                avg_spend: 0.0,
                tx_count: 0,
                avg_risk: 0.0,
            },
        }
    }
}

/// Side-by-side figures for two users over the same filtered set.
/// Picking the same user twice is allowed and mirrors the figures.
pub fn compare_users(index: &StatsIndex, a: &str, b: &str) -> (UserComparison, UserComparison) {
    (
        UserComparison::from_index(index, a),
        UserComparison::from_index(index, b),
    )
}

// ── Heatmap ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub category: String,
    pub country: String,
    pub count: u64,
    pub mean_risk: f64,
}

/// Mean risk per category × country cell, restricted to the top-N most
/// frequent of each (ties broken by first-seen order). Cells absent
/// from `cells` carry an implicit zero intensity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Heatmap {
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub cells: Vec<HeatmapCell>,
}

impl Heatmap {
    pub fn build(transactions: &[Transaction], top_n: usize) -> Self {
        let categories = top_labels(transactions, top_n, |t| &t.category);
        let countries = top_labels(transactions, top_n, |t| &t.country);

        let mut acc: HashMap<(usize, usize), (u64, f64)> = HashMap::new();
        for t in transactions {
            let cat = categories.iter().position(|c| c == &t.category);
            let ctry = countries.iter().position(|c| c == &t.country);
            if let (Some(ci), Some(ki)) = (cat, ctry) {
                let cell = acc.entry((ci, ki)).or_insert((0, 0.0));
                cell.0 += 1;
                cell.1 += t.fraud_score;
            }
        }

        let mut cells: Vec<HeatmapCell> = acc
            .into_iter()
            .map(|((ci, ki), (count, risk_sum))| HeatmapCell {
                category: categories[ci].clone(),
                country: countries[ki].clone(),
                count,
                mean_risk: risk_sum / count as f64,
            })
            .collect();
        cells.sort_by(|a, b| {
            (a.category.as_str(), a.country.as_str())
                .cmp(&(b.category.as_str(), b.country.as_str()))
        });

        Self {
            categories,
            countries,
            cells,
        }
    }

    pub fn cell(&self, category: &str, country: &str) -> Option<&HeatmapCell> {
        self.cells
            .iter()
            .find(|c| c.category == category && c.country == country)
    }
}

/// Top-N labels by transaction count, first-seen order breaking ties.
fn top_labels<F>(transactions: &[Transaction], top_n: usize, key: F) -> Vec<String>
where
    F: Fn(&Transaction) -> &String,
{
    let mut counts: Vec<(String, u64)> = Vec::new();
    for t in transactions {
        let label = key(t);
        match counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label.clone(), 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_n).map(|(l, _)| l).collect()
}
