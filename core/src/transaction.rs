//! Transaction data model and the dashboard wire payload.
//!
//! Transactions arrive from the backend already scored — the engine
//! never recomputes fraud scores. Rows are immutable once loaded;
//! every derived view works on copies.
//!
//! Data-shape policy: a missing fraud score reads as 0.0, missing
//! detection flags read as false, and missing labels read as "unknown",
//! so a sparse upload still renders instead of failing.

use crate::types::{TxnId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn unknown_label() -> String {
    "unknown".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    #[serde(default = "unknown_label")]
    pub category: String,
    #[serde(default = "unknown_label")]
    pub merchant: String,
    #[serde(default = "unknown_label")]
    pub country: String,
    #[serde(default)]
    pub fraud_score: f64,
    #[serde(default)]
    pub rule_based_fraud_flag: bool,
    #[serde(default)]
    pub model_fraud_flag: bool,
    #[serde(default)]
    pub velocity_flag: bool,
}

impl Transaction {
    /// True when any of the three independent detectors fired.
    pub fn has_detection_flag(&self) -> bool {
        self.rule_based_fraud_flag || self.model_fraud_flag || self.velocity_flag
    }

    /// Flagged for KPI purposes: the score meets the active threshold
    /// or at least one detector fired.
    pub fn is_flagged(&self, threshold: f64) -> bool {
        self.fraud_score >= threshold || self.has_detection_flag()
    }
}

/// Analyst-entered profile captured at upload time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sheet_type: String,
}

/// The `/dashboard_data` response shape. Only `transactions` drives the
/// engine; the remaining sections are pre-rendered server aggregates
/// that chart collaborators consume as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub insights: Option<serde_json::Value>,
    #[serde(default)]
    pub category_chart: Option<serde_json::Value>,
    #[serde(default)]
    pub monthly_trends: Option<serde_json::Value>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub sample_rows: Option<serde_json::Value>,
    #[serde(default)]
    pub fraud_table: Option<serde_json::Value>,
    #[serde(default)]
    pub cluster_insights: Option<serde_json::Value>,
}

/// Whether a dataset has been loaded this session. "No data yet" is a
/// distinguished state, not an error: the dashboard renders placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    #[default]
    NoData,
    Loaded,
}
