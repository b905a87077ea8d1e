//! Engine tuning knobs with dashboard defaults.
//!
//! Everything here has a sensible default; `load` reads an optional
//! JSON override file so deployments can tune thresholds without a
//! rebuild. In tests, use `EngineConfig::default()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global risk cutoff applied when no user preference is stored yet.
    pub default_risk_threshold: f64,
    /// Rows per table page.
    pub page_size: usize,
    /// Delay before a debounced input triggers a recompute.
    pub debounce_ms: i64,
    /// Categories × countries kept in the risk heatmap.
    pub heatmap_top_n: usize,
    pub counterfactual: CounterfactualOffsets,
}

/// Fixed heuristic score reductions used by the what-if estimator.
/// These are illustrative offsets, not a re-scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterfactualOffsets {
    /// Applied when a country-change signal is hypothetically ignored.
    pub country_change: f64,
    /// Applied when a capped amount would no longer look unusual.
    pub amount_cap: f64,
    /// Default fraction of the original amount used by the cap toggle.
    pub amount_cap_fraction: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_risk_threshold: 0.6,
            page_size: 10,
            debounce_ms: 300,
            heatmap_top_n: 5,
            counterfactual: CounterfactualOffsets {
                country_change: 0.15,
                amount_cap: 0.20,
                amount_cap_fraction: 0.5,
            },
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Ok(serde_json::from_str(&content)?)
    }
}
