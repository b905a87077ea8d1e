//! Analyst case workflow — one review record per flagged transaction.
//!
//! This module:
//!   1. Creates at most one case per transaction id
//!   2. Tracks the open/review/escalated/closed workflow (any → any)
//!   3. Appends a timestamped history entry on every transition
//!   4. Persists the full case list immediately after every mutation
//!
//! RULE: The case manager exclusively owns the persisted case list.
//! Other components read counts through it — never the store key.

use crate::error::EngineResult;
use crate::store::{KvStore, CASE_LIST_KEY};
use crate::transaction::Transaction;
use crate::types::{TxnId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow states. Transitions are analyst-driven and unordered —
/// any state is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    Review,
    Escalated,
    Closed,
}

impl CaseStatus {
    pub fn label(self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Review => "review",
            CaseStatus::Escalated => "escalated",
            CaseStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Case id — always the flagged transaction's id.
    pub id: TxnId,
    pub user_id: UserId,
    pub amount: f64,
    pub country: String,
    /// Fraud score captured at creation time; later rescoring of the
    /// dataset never rewrites an open case.
    pub fraud_score: f64,
    pub status: CaseStatus,
    /// Append-only transition log.
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of `add_case`. `Duplicate` carries the user-visible notice;
/// the case list is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCaseOutcome {
    Created,
    Duplicate,
}

pub struct CaseManager {
    store: KvStore,
    cases: Vec<CaseRecord>,
}

impl CaseManager {
    /// Load the persisted case list. An absent or unreadable list
    /// starts empty rather than failing the session.
    pub fn open(store: KvStore) -> EngineResult<Self> {
        let cases = match store.get(CASE_LIST_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable case list: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { store, cases })
    }

    /// Open a case for a flagged transaction. Idempotent per
    /// transaction id: a second call is a no-op with a duplicate notice.
    pub fn add_case(
        &mut self,
        txn: &Transaction,
        now: DateTime<Utc>,
    ) -> EngineResult<AddCaseOutcome> {
        if self.cases.iter().any(|c| c.id == txn.id) {
            log::warn!("Case for transaction {} already exists", txn.id);
            return Ok(AddCaseOutcome::Duplicate);
        }
        self.cases.push(CaseRecord {
            id: txn.id.clone(),
            user_id: txn.user_id.clone(),
            amount: txn.amount,
            country: txn.country.clone(),
            fraud_score: txn.fraud_score,
            status: CaseStatus::Open,
            history: vec![HistoryEntry {
                at: now,
                label: "Case opened".into(),
            }],
            created_at: now,
        });
        self.persist()?;
        log::debug!("Opened case {}", txn.id);
        Ok(AddCaseOutcome::Created)
    }

    /// Move a case to a new status. Unknown ids degrade to a logged
    /// no-op; returns whether anything changed.
    pub fn update_status(
        &mut self,
        case_id: &str,
        status: CaseStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let Some(case) = self.cases.iter_mut().find(|c| c.id == case_id) else {
            log::warn!("update_status on unknown case {case_id}");
            return Ok(false);
        };
        case.status = status;
        case.history.push(HistoryEntry {
            at: now,
            label: format!("Status set to {}", status.label()),
        });
        self.persist()?;
        Ok(true)
    }

    /// Drop every case, unconditionally.
    pub fn clear_all(&mut self) -> EngineResult<()> {
        self.cases.clear();
        self.persist()
    }

    pub fn count(&self) -> usize {
        self.cases.len()
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn get(&self, case_id: &str) -> Option<&CaseRecord> {
        self.cases.iter().find(|c| c.id == case_id)
    }

    fn persist(&self) -> EngineResult<()> {
        let json = serde_json::to_string(&self.cases)?;
        self.store.put(CASE_LIST_KEY, &json)
    }
}
