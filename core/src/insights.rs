//! High-level insight rollups: headline spend figures, the flagged-row
//! fraud table, and the heuristic anomaly clusters.
//!
//! Everything here is plain data in, plain data out — chart and export
//! collaborators render these, the engine never touches a surface.

use crate::transaction::Transaction;
use crate::types::UserId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Score floor above which an otherwise unflagged row still lands in
/// the fraud table.
pub const FRAUD_TABLE_SCORE_FLOOR: f64 = 0.5;

/// Guard against dividing by a zero max score when normalizing.
const SCORE_EPSILON: f64 = 1e-6;

const TOP_CATEGORY_CLUSTERS: usize = 3;
const TOP_COUNTRY_CLUSTERS: usize = 2;
const TOP_VELOCITY_CLUSTERS: usize = 2;
const MAX_CLUSTERS: usize = 5;

// ── Insights report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub total_spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM` bucket label.
    pub month: String,
    pub total_spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub total_spend: f64,
    pub avg_transaction: f64,
    pub tx_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightsReport {
    pub total_spend: f64,
    /// Categories by total spend, descending.
    pub top_categories: Vec<CategorySpend>,
    /// Month buckets in chronological order.
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Per-user figures, in first-seen order.
    pub user_summaries: Vec<UserSummary>,
}

impl InsightsReport {
    pub fn build(transactions: &[Transaction]) -> Self {
        if transactions.is_empty() {
            return Self::default();
        }

        let total_spend: f64 = transactions.iter().map(|t| t.amount).sum();

        let mut categories: Vec<(String, f64)> = Vec::new();
        for t in transactions {
            match categories.iter_mut().find(|(c, _)| c == &t.category) {
                Some((_, sum)) => *sum += t.amount,
                None => categories.push((t.category.clone(), t.amount)),
            }
        }
        categories.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let top_categories = categories
            .into_iter()
            .map(|(category, total_spend)| CategorySpend {
                category,
                total_spend,
            })
            .collect();

        // BTreeMap keys are YYYY-MM strings, so iteration order is
        // already chronological.
        let mut months: BTreeMap<String, f64> = BTreeMap::new();
        for t in transactions {
            *months.entry(t.timestamp.format("%Y-%m").to_string()).or_default() += t.amount;
        }
        let monthly_trends = months
            .into_iter()
            .map(|(month, total_spend)| MonthlyTrend {
                month,
                total_spend,
            })
            .collect();

        let mut user_ids: Vec<UserId> = Vec::new();
        let mut sums: Vec<(f64, u64)> = Vec::new();
        for t in transactions {
            match user_ids.iter().position(|u| u == &t.user_id) {
                Some(i) => {
                    sums[i].0 += t.amount;
                    sums[i].1 += 1;
                }
                None => {
                    user_ids.push(t.user_id.clone());
                    sums.push((t.amount, 1));
                }
            }
        }
        let user_summaries = user_ids
            .into_iter()
            .zip(sums)
            .map(|(user_id, (total, count))| UserSummary {
                user_id,
                total_spend: total,
                avg_transaction: total / count as f64,
                tx_count: count,
            })
            .collect();

        Self {
            total_spend,
            top_categories,
            monthly_trends,
            user_summaries,
        }
    }
}

// ── Fraud table ──────────────────────────────────────────────────────────────

/// The flagged-only review table: any detector fired, or the score
/// clears the table floor. Highest score first.
pub fn build_fraud_table(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut rows: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.has_detection_flag() || t.fraud_score > FRAUD_TABLE_SCORE_FLOOR)
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.fraud_score
            .partial_cmp(&a.fraud_score)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

// ── Anomaly clusters ─────────────────────────────────────────────────────────

/// A lightweight, human-readable anomaly grouping with a [0, 1] score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterInsight {
    pub name: String,
    pub score: f64,
}

/// Heuristic clusters: risky categories, geographic hotspots, and
/// velocity-heavy users, normalized against the max observed score and
/// capped at the five strongest.
pub fn build_cluster_insights(transactions: &[Transaction]) -> Vec<ClusterInsight> {
    if transactions.is_empty() {
        return Vec::new();
    }

    let score_max = transactions
        .iter()
        .map(|t| t.fraud_score)
        .fold(SCORE_EPSILON, f64::max);
    let norm = |score: f64| (score / score_max).clamp(0.0, 1.0);

    let mut clusters: Vec<ClusterInsight> = Vec::new();

    clusters.extend(
        grouped_mean(transactions, |t| &t.category, norm)
            .into_iter()
            .take(TOP_CATEGORY_CLUSTERS)
            .map(|(label, score)| ClusterInsight {
                name: format!("Category spike: {label}"),
                score,
            }),
    );

    clusters.extend(
        grouped_mean(transactions, |t| &t.country, norm)
            .into_iter()
            .take(TOP_COUNTRY_CLUSTERS)
            .map(|(label, score)| ClusterInsight {
                name: format!("Geo hotspot: {label}"),
                score,
            }),
    );

    // Velocity bursts: share of a user's rows the velocity detector hit.
    let mut users: Vec<(UserId, u64, u64)> = Vec::new();
    for t in transactions {
        match users.iter_mut().find(|(u, _, _)| u == &t.user_id) {
            Some((_, total, hits)) => {
                *total += 1;
                if t.velocity_flag {
                    *hits += 1;
                }
            }
            None => users.push((t.user_id.clone(), 1, u64::from(t.velocity_flag))),
        }
    }
    let mut bursts: Vec<ClusterInsight> = users
        .into_iter()
        .filter(|(_, _, hits)| *hits > 0)
        .map(|(user, total, hits)| ClusterInsight {
            name: format!("Velocity burst: {user}"),
            score: hits as f64 / total as f64,
        })
        .collect();
    bursts.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    clusters.extend(bursts.into_iter().take(TOP_VELOCITY_CLUSTERS));

    clusters.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    clusters.truncate(MAX_CLUSTERS);
    clusters
}

/// Mean normalized score per label, sorted descending; first-seen order
/// breaks ties via the stable sort.
fn grouped_mean<F, N>(transactions: &[Transaction], key: F, norm: N) -> Vec<(String, f64)>
where
    F: Fn(&Transaction) -> &String,
    N: Fn(f64) -> f64,
{
    let mut groups: Vec<(String, f64, u64)> = Vec::new();
    for t in transactions {
        let label = key(t);
        match groups.iter_mut().find(|(l, _, _)| l == label) {
            Some((_, sum, count)) => {
                *sum += norm(t.fraud_score);
                *count += 1;
            }
            None => groups.push((label.clone(), norm(t.fraud_score), 1)),
        }
    }
    let mut means: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(label, sum, count)| (label, sum / count as f64))
        .collect();
    means.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    means
}
