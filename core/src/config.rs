//! Normalization and display configuration.
//!
//! Raw feeds arrive with inconsistent categorical labels (retailer panel
//! suffixes, a zoo of promo-tactic spellings, "unknown" offer fields). The
//! cleanup rules live here as data, not code, so a new feed only needs a
//! config change. A built-in default carries the canonical maps; a
//! `normalize_config.json` in the data directory overrides them.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CONFIG_FILE: &str = "normalize_config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Raw retailer label → clean label, applied before upper-casing.
    pub retailer_aliases: HashMap<String, String>,

    /// Raw promo-tactic label → canonical tactic.
    pub tactic_aliases: HashMap<String, String>,

    /// Substitute for an "unknown" offer type, applied before upper-casing.
    pub offer_type_fallback: String,

    /// Substitute for an "unknown" offer mechanic.
    pub offer_mechanic_fallback: String,

    /// Canonical display ordering for promo tactics. Tactics not listed
    /// sort after listed ones, alphabetically. Display concern only — no
    /// financial computation depends on this.
    pub tactic_order: Vec<String>,

    /// Cap applied to the distribution elasticity coefficient at load time.
    pub distribution_elasticity_cap: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        let retailer_aliases = [
            ("Target PT", "Target"),
            ("Publix Total TA", "Publix"),
            ("CVS Total Corp ex HI TA", "CVS"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let tactic_aliases = [
            ("unknown", "Display"),
            ("Display & TPR", "Display"),
            ("Display Only", "Display"),
            ("No Tactic", "Feature"),
            ("Feature & TPR", "Feature"),
            ("Feature Only", "Feature"),
            ("TPR Only", "TPR"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            retailer_aliases,
            tactic_aliases,
            offer_type_fallback: "spend_reward".to_string(),
            offer_mechanic_fallback: "special x off".to_string(),
            tactic_order: vec![
                "TPR".to_string(),
                "Display".to_string(),
                "Feature".to_string(),
            ],
            distribution_elasticity_cap: 1.0,
        }
    }
}

impl NormalizeConfig {
    /// Load from `<data_dir>/normalize_config.json`. A missing file falls
    /// back to the built-in defaults; any other read failure is fatal.
    pub fn load(data_dir: &str) -> AnalyticsResult<Self> {
        let path = format!("{data_dir}/{CONFIG_FILE}");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config: {path} not found, using built-in defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(AnalyticsError::DataUnavailable { path, source: e }),
        };

        let config: Self = serde_json::from_str(&content)?;
        log::info!(
            "config: loaded {path} ({} retailer aliases, {} tactic aliases)",
            config.retailer_aliases.len(),
            config.tactic_aliases.len()
        );
        Ok(config)
    }

    /// Sort key for the canonical tactic display ordering.
    pub fn tactic_sort_key(&self, tactic: &str) -> (usize, String) {
        let rank = self
            .tactic_order
            .iter()
            .position(|t| t == tactic)
            .unwrap_or(self.tactic_order.len());
        (rank, tactic.to_string())
    }

    /// Sort a list of tactics into the canonical display order.
    pub fn sort_tactics(&self, tactics: &mut [String]) {
        tactics.sort_by_key(|t| self.tactic_sort_key(t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tactic_ordering() {
        let config = NormalizeConfig::default();
        let mut tactics = vec![
            "Feature".to_string(),
            "Bonus Pack".to_string(),
            "TPR".to_string(),
            "Display".to_string(),
        ];
        config.sort_tactics(&mut tactics);
        assert_eq!(tactics, ["TPR", "Display", "Feature", "Bonus Pack"]);
    }
}
