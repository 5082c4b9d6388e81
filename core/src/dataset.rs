//! Dataset loading and preparation.
//!
//! One flat table of historical product/retailer/time records, loaded once
//! per process from the data directory and treated as an immutable snapshot
//! afterwards. Preparation normalizes categorical labels, caps the
//! distribution elasticity, derives the monthly date key, and snaps each
//! promo start date back to its week start for exact-match scheduling.

use crate::{
    config::NormalizeConfig,
    error::{AnalyticsError, AnalyticsResult},
    types::{Month, Year},
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DATASET_FILE: &str = "sales_records.json";

/// One row of the consolidated sales/pricing dataset.
///
/// The promotion-variant columns carry serde defaults: rows from the pure
/// pricing feed leave them blank/zero and never match event predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub manufacturer: String,
    pub brand:        String,
    pub ppg:          String,
    pub retailer:     String,
    #[serde(default)]
    pub year:         Year,
    #[serde(default)]
    pub month:        Month,

    #[serde(default)]
    pub volume:             f64,
    #[serde(default)]
    pub revenue:            f64,
    #[serde(default)]
    pub price:              f64,
    /// %ACV weighted distribution.
    #[serde(default)]
    pub distribution:       f64,
    #[serde(default)]
    pub competitor_price:   f64,
    #[serde(default)]
    pub promo_investment:   f64,
    #[serde(default)]
    pub incremental_volume: f64,
    #[serde(default)]
    pub baseline_volume:    f64,
    #[serde(default)]
    pub incr_revenue:       f64,
    #[serde(default)]
    pub total_volume:       f64,

    #[serde(default)]
    pub price_elasticity:            f64,
    #[serde(default)]
    pub competitor_price_elasticity: f64,
    #[serde(default)]
    pub distribution_elasticity:     f64,

    #[serde(default)]
    pub promo_tactic:        String,
    #[serde(default)]
    pub offer_type:          String,
    #[serde(default)]
    pub offer_mechanic:      String,
    #[serde(default)]
    pub start_date:          Option<NaiveDate>,
    #[serde(default)]
    pub promo_duration_days: u32,
    #[serde(default)]
    pub discount:            f64,
    #[serde(default)]
    pub redemption_rate:     f64,

    /// Derived at load time: `start_date` snapped back to the Sunday
    /// before it. Event scheduling matches on this, not the raw date.
    #[serde(default)]
    pub promo_week_start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    records: Vec<SalesRecord>,
}

/// The loaded, normalized dataset. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<SalesRecord>,
}

impl Dataset {
    /// Load `<data_dir>/sales_records.json` and normalize every record.
    ///
    /// A missing or unreadable file is `DataUnavailable`; JSON that does not
    /// carry the expected columns is `Malformed`. Both are fatal for the
    /// request — the core does not own schema migration.
    pub fn load(data_dir: &str, config: &NormalizeConfig) -> AnalyticsResult<Self> {
        let path = format!("{data_dir}/{DATASET_FILE}");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| AnalyticsError::DataUnavailable {
                path: path.clone(),
                source: e,
            })?;

        let file: DatasetFile = serde_json::from_str(&content)?;
        let dataset = Self::from_records(file.records, config);
        log::info!("dataset: loaded {} records from {path}", dataset.records.len());
        Ok(dataset)
    }

    /// Build a dataset from in-memory records, applying the same
    /// normalization as the file path. Used by tests and embedding callers.
    pub fn from_records(mut records: Vec<SalesRecord>, config: &NormalizeConfig) -> Self {
        for record in &mut records {
            normalize_record(record, config);
        }
        Self { records }
    }
}

fn normalize_record(record: &mut SalesRecord, config: &NormalizeConfig) {
    if let Some(clean) = config.retailer_aliases.get(&record.retailer) {
        record.retailer = clean.clone();
    }
    record.retailer = record.retailer.to_uppercase();

    if let Some(canonical) = config.tactic_aliases.get(&record.promo_tactic) {
        record.promo_tactic = canonical.clone();
    }

    if record.offer_type == "unknown" {
        record.offer_type = config.offer_type_fallback.clone();
    }
    record.offer_type = record.offer_type.to_uppercase().replace('_', " ");

    if record.offer_mechanic == "unknown" {
        record.offer_mechanic = config.offer_mechanic_fallback.clone();
    }

    // Cap, not re-derive: upstream model fitting occasionally emits
    // distribution coefficients above 1.0.
    if record.distribution_elasticity > config.distribution_elasticity_cap {
        record.distribution_elasticity = config.distribution_elasticity_cap;
    }

    if let Some(start) = record.start_date {
        if record.month == 0 {
            record.month = start.month();
        }
        if record.year == 0 {
            record.year = start.year();
        }
        record.promo_week_start = Some(snap_to_week_start(start));
    }
}

/// Snap a date back to the Sunday strictly before it (a Sunday snaps to the
/// previous Sunday, matching the feed's week convention).
pub fn snap_to_week_start(date: NaiveDate) -> NaiveDate {
    let days_back = date.weekday().num_days_from_monday() as i64 + 1;
    date - Duration::days(days_back)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(retailer: &str, tactic: &str) -> SalesRecord {
        SalesRecord {
            manufacturer: "Acme".into(),
            brand: "Shine".into(),
            ppg: "PPG-1".into(),
            retailer: retailer.into(),
            year: 2024,
            month: 1,
            promo_tactic: tactic.into(),
            offer_type: "unknown".into(),
            offer_mechanic: "unknown".into(),
            ..SalesRecord::default()
        }
    }

    #[test]
    fn labels_are_normalized() {
        let config = NormalizeConfig::default();
        let dataset = Dataset::from_records(
            vec![record_with("Target PT", "Feature & TPR")],
            &config,
        );
        let r = &dataset.records[0];
        assert_eq!(r.retailer, "TARGET");
        assert_eq!(r.promo_tactic, "Feature");
        assert_eq!(r.offer_type, "SPEND REWARD");
        assert_eq!(r.offer_mechanic, "special x off");
    }

    #[test]
    fn distribution_elasticity_is_capped() {
        let config = NormalizeConfig::default();
        let mut raw = record_with("Kroger", "TPR Only");
        raw.distribution_elasticity = 1.8;
        let dataset = Dataset::from_records(vec![raw], &config);
        assert_eq!(dataset.records[0].distribution_elasticity, 1.0);
    }

    #[test]
    fn month_and_week_start_derived_from_start_date() {
        let config = NormalizeConfig::default();
        let mut raw = record_with("Kroger", "TPR Only");
        raw.month = 0;
        // 2024-06-12 is a Wednesday; week start is Sunday 2024-06-09.
        raw.start_date = NaiveDate::from_ymd_opt(2024, 6, 12);
        let dataset = Dataset::from_records(vec![raw], &config);
        let r = &dataset.records[0];
        assert_eq!(r.month, 6);
        assert_eq!(r.promo_week_start, NaiveDate::from_ymd_opt(2024, 6, 9));
    }

    #[test]
    fn sunday_snaps_to_previous_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(
            snap_to_week_start(sunday),
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
        );
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let config = NormalizeConfig::default();
        let err = Dataset::load("/nonexistent-dir", &config).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AnalyticsError::DataUnavailable { .. }
        ));
    }
}
