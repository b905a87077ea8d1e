//! Dashboard orchestration — the synchronous request/recompute/render
//! cycle.
//!
//! EXECUTION ORDER on every threshold or time-range change (fixed,
//! never reordered):
//!   1. Apply the active time-range filter to the loaded set
//!   2. Rebuild per-user / per-country aggregates
//!   3. Reload the transaction and flagged-review table views
//!   4. Re-run the threshold simulation and insight rollups
//!
//! RULES:
//!   - The controller owns the transaction set and every derived view;
//!     tables and stats treat them as read-only and are replaced
//!     wholesale on each recompute.
//!   - The case list belongs to the case manager; the controller only
//!     reads the open-case count for KPI display.
//!   - All UI preferences flow through the store, so chart and export
//!     collaborators observe changes via their subscriptions.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::insights::{self, ClusterInsight, InsightsReport};
use crate::simulator::{self, CounterfactualEstimate, MitigationToggles, ThresholdSimulation};
use crate::state::{Store, TimeRange, UiState};
use crate::stats::{self, Driver, Heatmap, StatsIndex, UserComparison};
use crate::table::TableView;
use crate::transaction::{DashboardPayload, DataStatus, Transaction};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Placeholder shown for KPI values before any data is loaded.
pub const KPI_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub status: DataStatus,
    pub total_transactions: usize,
    /// Glossary definition: score meets the threshold OR any detector
    /// fired.
    pub flagged: usize,
    pub total_spend: f64,
    pub flag_rate: f64,
    pub open_cases: usize,
}

impl KpiSummary {
    /// Formatted figures degrade to the placeholder in the no-data
    /// state so an empty dashboard renders instead of erroring.
    pub fn display_total(&self) -> String {
        self.display(|s| s.total_transactions.to_string())
    }

    pub fn display_flagged(&self) -> String {
        self.display(|s| s.flagged.to_string())
    }

    pub fn display_spend(&self) -> String {
        self.display(|s| format!("{:.2}", s.total_spend))
    }

    pub fn display_open_cases(&self) -> String {
        self.display(|s| s.open_cases.to_string())
    }

    fn display<F: Fn(&Self) -> String>(&self, f: F) -> String {
        match self.status {
            DataStatus::NoData => KPI_PLACEHOLDER.into(),
            DataStatus::Loaded => f(self),
        }
    }
}

pub struct DashboardController {
    config: EngineConfig,
    store: Store,
    all_transactions: Vec<Transaction>,
    filtered: Vec<Transaction>,
    stats: StatsIndex,
    insights: InsightsReport,
    clusters: Vec<ClusterInsight>,
    heatmap: Heatmap,
    simulation: ThresholdSimulation,
    txn_table: TableView<Transaction>,
    flagged_table: TableView<Transaction>,
    /// Rolling windows anchor here — the load instant, since the
    /// dataset is fetched once per session.
    reference_time: DateTime<Utc>,
    status: DataStatus,
}

impl DashboardController {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let store = Store::new()?;
        Ok(Self::with_store(config, store))
    }

    /// Inject a pre-built store (collaborators may already hold
    /// subscriptions on it).
    pub fn with_store(config: EngineConfig, store: Store) -> Self {
        let page_size = config.page_size;
        let simulation = simulator::simulate(&[], config.default_risk_threshold);
        Self {
            config,
            store,
            all_transactions: Vec::new(),
            filtered: Vec::new(),
            stats: StatsIndex::default(),
            insights: InsightsReport::default(),
            clusters: Vec::new(),
            heatmap: Heatmap::default(),
            simulation,
            txn_table: TableView::new(page_size),
            flagged_table: TableView::new(page_size),
            reference_time: DateTime::<Utc>::UNIX_EPOCH,
            status: DataStatus::NoData,
        }
    }

    // ── Loading ────────────────────────────────────────────────

    /// Ingest a dashboard payload. An absent or empty transaction set
    /// yields the distinguished no-data state, never an error.
    pub fn load(&mut self, payload: DashboardPayload, now: DateTime<Utc>) -> EngineResult<DataStatus> {
        self.reference_time = now;
        if let Some(profile) = payload.user_profile {
            self.store.set("profile", serde_json::to_value(&profile)?)?;
        }

        self.all_transactions = payload.transactions;
        self.status = if self.all_transactions.is_empty() {
            DataStatus::NoData
        } else {
            DataStatus::Loaded
        };
        self.store
            .set("data.status", serde_json::to_value(self.status)?)?;
        self.store
            .set("data.row_count", json!(self.all_transactions.len()))?;

        self.recompute();
        log::debug!(
            "Loaded {} transactions ({:?})",
            self.all_transactions.len(),
            self.status
        );
        Ok(self.status)
    }

    // ── UI preference changes ──────────────────────────────────

    pub fn set_time_range(&mut self, range: TimeRange) -> EngineResult<()> {
        self.store
            .set("ui.time_range", serde_json::to_value(range)?)?;
        self.recompute();
        Ok(())
    }

    /// The slider does not hard-clamp; out-of-range values are clamped
    /// where they are consumed.
    pub fn set_risk_threshold(&mut self, threshold: f64) -> EngineResult<()> {
        self.store.set("ui.risk_threshold", json!(threshold))?;
        self.recompute();
        Ok(())
    }

    pub fn set_chart_type(&mut self, chart_type: &str) -> EngineResult<()> {
        self.store.set("ui.chart_type", json!(chart_type))?;
        Ok(())
    }

    pub fn set_advanced_mode(&mut self, on: bool) -> EngineResult<()> {
        self.store.set("ui.advanced_mode", json!(on))?;
        Ok(())
    }

    // ── Derived views ──────────────────────────────────────────

    pub fn ui(&self) -> UiState {
        self.store.ui()
    }

    pub fn status(&self) -> DataStatus {
        self.status
    }

    /// The time-range-filtered set all derived views are built from.
    pub fn filtered(&self) -> &[Transaction] {
        &self.filtered
    }

    pub fn stats(&self) -> &StatsIndex {
        &self.stats
    }

    pub fn insights(&self) -> &InsightsReport {
        &self.insights
    }

    pub fn clusters(&self) -> &[ClusterInsight] {
        &self.clusters
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn simulation(&self) -> ThresholdSimulation {
        self.simulation
    }

    pub fn txn_table(&self) -> &TableView<Transaction> {
        &self.txn_table
    }

    pub fn txn_table_mut(&mut self) -> &mut TableView<Transaction> {
        &mut self.txn_table
    }

    pub fn flagged_table(&self) -> &TableView<Transaction> {
        &self.flagged_table
    }

    pub fn flagged_table_mut(&mut self) -> &mut TableView<Transaction> {
        &mut self.flagged_table
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Driver list for one filtered transaction; None for ids the
    /// current filter does not contain.
    pub fn drivers_for(&self, txn_id: &str) -> Option<Vec<Driver>> {
        let txn = self.filtered.iter().find(|t| t.id == txn_id)?;
        let user = self.stats.user(&txn.user_id)?;
        Some(stats::drivers(txn, user))
    }

    pub fn compare_users(&self, a: &str, b: &str) -> (UserComparison, UserComparison) {
        stats::compare_users(&self.stats, a, b)
    }

    pub fn counterfactual(&self, toggles: MitigationToggles) -> CounterfactualEstimate {
        simulator::counterfactual(
            &self.filtered,
            &self.stats,
            self.ui().risk_threshold,
            toggles,
            &self.config.counterfactual,
        )
    }

    /// Headline figures. The open-case count comes from the case
    /// manager — the controller never touches the case list itself.
    pub fn kpis(&self, open_cases: usize) -> KpiSummary {
        let threshold = self.ui().risk_threshold;
        let flagged = self
            .filtered
            .iter()
            .filter(|t| t.is_flagged(threshold))
            .count();
        KpiSummary {
            status: self.status,
            total_transactions: self.filtered.len(),
            flagged,
            total_spend: self.insights.total_spend,
            flag_rate: self.simulation.flag_rate,
            open_cases,
        }
    }

    // ── Recompute cycle ────────────────────────────────────────

    fn recompute(&mut self) {
        let ui = self.store.ui();

        self.filtered = match ui.time_range.days() {
            None => self.all_transactions.clone(),
            Some(days) => {
                let cutoff = self.reference_time - Duration::days(days);
                self.all_transactions
                    .iter()
                    .filter(|t| t.timestamp >= cutoff)
                    .cloned()
                    .collect()
            }
        };

        self.stats = StatsIndex::build(&self.filtered);
        self.insights = InsightsReport::build(&self.filtered);
        self.clusters = insights::build_cluster_insights(&self.filtered);
        self.heatmap = Heatmap::build(&self.filtered, self.config.heatmap_top_n);
        self.simulation = simulator::simulate(&self.filtered, ui.risk_threshold);

        self.txn_table.set_rows(self.filtered.clone());
        self.flagged_table
            .set_rows(insights::build_fraud_table(&self.filtered));

        log::debug!(
            "Recomputed: {} rows in range, {} flagged for review",
            self.filtered.len(),
            self.flagged_table.result_len()
        );
    }
}
