//! Elasticity aggregation — benchmark vs selection.
//!
//! Elasticity coefficients are pre-computed inputs on each row; this module
//! only averages them. The averaging is deliberately two-level: first the
//! mean per (manufacturer, brand, retailer, ppg) group, then the mean across
//! groups, so each product/retailer combination carries equal weight no
//! matter how many historical rows it contributed.

use crate::{
    dataset::SalesRecord,
    error::{AnalyticsError, AnalyticsResult},
    types::safe_ratio,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The three coefficients of the linear elasticity model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticityTriple {
    pub price:            f64,
    pub competitor_price: f64,
    pub distribution:     f64,
}

/// Category benchmark vs filtered selection. `None` means the scope had no
/// rows — downstream rendering must show "no data", not zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElasticityComparison {
    pub benchmark: Option<ElasticityTriple>,
    pub selection: Option<ElasticityTriple>,
}

/// One [benchmark, selection] bar pair for charting.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkPair {
    pub driver:    &'static str,
    pub benchmark: Option<f64>,
    pub selection: Option<f64>,
}

impl BenchmarkPair {
    /// The selection's coefficient as a percentage of the benchmark,
    /// division-guarded. `None` when either side has no data.
    pub fn selection_vs_benchmark_pct(&self) -> Option<f64> {
        match (self.benchmark, self.selection) {
            (Some(b), Some(s)) => Some(safe_ratio(s, b) * 100.0),
            _ => None,
        }
    }
}

/// A column usable as an aggregation key. Parsing an unknown column name is
/// an `InvalidGrouping` error, surfaced to the caller as client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Manufacturer,
    Brand,
    Ppg,
    Retailer,
    Year,
    Month,
}

impl FromStr for GroupField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> AnalyticsResult<Self> {
        match s {
            "manufacturer" => Ok(Self::Manufacturer),
            "brand" => Ok(Self::Brand),
            "ppg" => Ok(Self::Ppg),
            "retailer" => Ok(Self::Retailer),
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            other => Err(AnalyticsError::InvalidGrouping(other.to_string())),
        }
    }
}

impl GroupField {
    fn key_of(&self, record: &SalesRecord) -> String {
        match self {
            Self::Manufacturer => record.manufacturer.clone(),
            Self::Brand => record.brand.clone(),
            Self::Ppg => record.ppg.clone(),
            Self::Retailer => record.retailer.clone(),
            Self::Year => record.year.to_string(),
            Self::Month => record.month.to_string(),
        }
    }
}

#[derive(Default)]
struct TripleAcc {
    price:            f64,
    competitor_price: f64,
    distribution:     f64,
    rows:             usize,
}

/// Two-level mean of the three coefficients over the fixed product grouping.
/// Returns `None` for an empty scope.
pub fn two_level_mean(records: &[SalesRecord]) -> Option<ElasticityTriple> {
    if records.is_empty() {
        return None;
    }

    let mut groups: BTreeMap<(String, String, String, String), TripleAcc> = BTreeMap::new();
    for r in records {
        let key = (
            r.manufacturer.clone(),
            r.brand.clone(),
            r.retailer.clone(),
            r.ppg.clone(),
        );
        let acc = groups.entry(key).or_default();
        acc.price += r.price_elasticity;
        acc.competitor_price += r.competitor_price_elasticity;
        acc.distribution += r.distribution_elasticity;
        acc.rows += 1;
    }

    let group_count = groups.len() as f64;
    let mut total = ElasticityTriple {
        price: 0.0,
        competitor_price: 0.0,
        distribution: 0.0,
    };
    for acc in groups.values() {
        let n = acc.rows as f64;
        total.price += acc.price / n;
        total.competitor_price += acc.competitor_price / n;
        total.distribution += acc.distribution / n;
    }

    Some(ElasticityTriple {
        price: total.price / group_count,
        competitor_price: total.competitor_price / group_count,
        distribution: total.distribution / group_count,
    })
}

/// Compare a filtered selection against the full-category benchmark.
pub fn compute_elasticity(filtered: &[SalesRecord], all: &[SalesRecord]) -> ElasticityComparison {
    ElasticityComparison {
        benchmark: two_level_mean(all),
        selection: two_level_mean(filtered),
    }
}

impl ElasticityComparison {
    /// Ordered [benchmark, selection] pairs per coefficient, in the fixed
    /// driver order price, competitor price, distribution.
    pub fn pairs(&self) -> [BenchmarkPair; 3] {
        [
            BenchmarkPair {
                driver: "price",
                benchmark: self.benchmark.map(|t| t.price),
                selection: self.selection.map(|t| t.price),
            },
            BenchmarkPair {
                driver: "competitor_price",
                benchmark: self.benchmark.map(|t| t.competitor_price),
                selection: self.selection.map(|t| t.competitor_price),
            },
            BenchmarkPair {
                driver: "distribution",
                benchmark: self.benchmark.map(|t| t.distribution),
                selection: self.selection.map(|t| t.distribution),
            },
        ]
    }
}

/// One group's slice of the scope's revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueShare {
    pub label:     String,
    pub revenue:   f64,
    pub share_pct: f64,
}

/// Revenue share per value of `field` within the given scope ("fair share"
/// benchmark). A zero total degrades every share to 0.
pub fn revenue_share(records: &[SalesRecord], field: GroupField) -> Vec<RevenueShare> {
    let total: f64 = records.iter().map(|r| r.revenue).sum();

    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        *groups.entry(field.key_of(r)).or_insert(0.0) += r.revenue;
    }

    groups
        .into_iter()
        .map(|(label, revenue)| RevenueShare {
            label,
            revenue,
            share_pct: safe_ratio(revenue, total) * 100.0,
        })
        .collect()
}
