//! Row-shape specializations for the two dashboard tables.
//!
//! The generic view stays shape-agnostic; everything audience-facing
//! (value formatting, risk badges) lives here as renderer strategies.
//!
//! Both tables band scores identically (low ≤ 0.40, then ≤ 0.75, then
//! high) but speak different vocabularies: the transaction explorer
//! addresses analysts, the flagged-review queue uses ops wording.
//! The two label sets are intentionally distinct — do not unify them.

use crate::table::{CellValue, TableRow};
use crate::transaction::Transaction;

pub const MEDIUM_RISK_FLOOR: f64 = 0.40;
pub const HIGH_RISK_FLOOR: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_FLOOR {
            RiskBand::High
        } else if score > MEDIUM_RISK_FLOOR {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    /// Transaction-explorer vocabulary.
    pub fn analyst_label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        }
    }

    /// Flagged-review-queue vocabulary over the same bands.
    pub fn ops_label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Warning",
            RiskBand::High => "Critical",
        }
    }
}

impl TableRow for Transaction {
    fn columns() -> &'static [&'static str] {
        &[
            "id",
            "user_id",
            "timestamp",
            "amount",
            "category",
            "merchant",
            "country",
            "fraud_score",
        ]
    }

    fn cell(&self, column: &str) -> CellValue {
        match column {
            "id" => CellValue::Str(self.id.clone()),
            "user_id" => CellValue::Str(self.user_id.clone()),
            "timestamp" => CellValue::Str(self.timestamp.to_rfc3339()),
            "amount" => CellValue::Num(self.amount),
            "category" => CellValue::Str(self.category.clone()),
            "merchant" => CellValue::Str(self.merchant.clone()),
            "country" => CellValue::Str(self.country.clone()),
            "fraud_score" => CellValue::Num(self.fraud_score),
            _ => CellValue::Str(String::new()),
        }
    }
}

/// One displayed row: formatted cells plus the risk badge text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub cells: Vec<String>,
    pub badge: &'static str,
}

/// Strategy mapping a row to its displayed representation. The base
/// view is composed with one of these, never subclassed.
pub trait RowRenderer<T> {
    fn render(&self, row: &T) -> RenderedRow;
}

/// Transaction explorer rows: full detail, analyst badge vocabulary.
pub struct TransactionRowRenderer;

impl RowRenderer<Transaction> for TransactionRowRenderer {
    fn render(&self, t: &Transaction) -> RenderedRow {
        RenderedRow {
            cells: vec![
                t.id.clone(),
                t.user_id.clone(),
                t.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                format!("{:.2}", t.amount),
                t.category.clone(),
                t.merchant.clone(),
                t.country.clone(),
                format!("{:.3}", t.fraud_score),
            ],
            badge: RiskBand::from_score(t.fraud_score).analyst_label(),
        }
    }
}

/// Flagged-review rows: lean columns, detector markers, ops badge
/// vocabulary.
pub struct FlaggedRowRenderer;

impl FlaggedRowRenderer {
    fn detector_markers(t: &Transaction) -> String {
        let mut markers = Vec::new();
        if t.rule_based_fraud_flag {
            markers.push("rule");
        }
        if t.model_fraud_flag {
            markers.push("model");
        }
        if t.velocity_flag {
            markers.push("velocity");
        }
        markers.join("+")
    }
}

impl RowRenderer<Transaction> for FlaggedRowRenderer {
    fn render(&self, t: &Transaction) -> RenderedRow {
        RenderedRow {
            cells: vec![
                t.id.clone(),
                t.user_id.clone(),
                format!("{:.2}", t.amount),
                t.country.clone(),
                format!("{:.3}", t.fraud_score),
                Self::detector_markers(t),
            ],
            badge: RiskBand::from_score(t.fraud_score).ops_label(),
        }
    }
}
