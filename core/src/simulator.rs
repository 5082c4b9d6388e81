//! Price/distribution what-if simulator.
//!
//! The core formula of the whole system: a linear elasticity composition
//! converting percentage changes in price, competitor price, and
//! distribution into a percentage change in volume, applied per product
//! group and rolled up to summary KPIs.

use crate::{
    dataset::SalesRecord,
    types::{pct_change, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A requested change to one driver. The absolute target is authoritative
/// when present; a target of exactly 0 means "not set" (the feed's
/// zero-means-untouched input convention). With neither representation the
/// driver is unchanged, contributing a 0% term.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverAdjustment {
    pub target:     Option<f64>,
    pub change_pct: Option<f64>,
}

impl DriverAdjustment {
    fn resolve(&self, base: f64) -> f64 {
        match (self.target, self.change_pct) {
            (Some(t), _) if t != 0.0 => t,
            (_, Some(p)) => base * (1.0 + p / 100.0),
            _ => base,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationAdjustment {
    pub price:            DriverAdjustment,
    pub competitor_price: DriverAdjustment,
    pub distribution:     DriverAdjustment,
}

/// One drill-through row: a (manufacturer, brand, retailer, ppg, year)
/// group with its baseline, resolved adjustment, and projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRow {
    pub manufacturer: String,
    pub brand:        String,
    pub retailer:     String,
    pub ppg:          String,
    pub year:         Year,

    pub price_elasticity:            f64,
    pub competitor_price_elasticity: f64,
    pub distribution_elasticity:     f64,

    pub price:                       f64,
    pub new_price:                   f64,
    pub price_change_pct:            f64,
    pub competitor_price:            f64,
    pub new_competitor_price:        f64,
    pub competitor_price_change_pct: f64,
    pub distribution:                f64,
    pub new_distribution:            f64,
    pub distribution_change_pct:     f64,

    pub volume:              f64,
    pub new_volume:          f64,
    pub volume_impact_pct:   f64,
    pub old_revenue:         f64,
    pub new_revenue:         f64,
    pub incremental_revenue: f64,
}

/// KPI-card aggregates over the whole subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub current_volume:      f64,
    pub new_volume:          f64,
    pub volume_impact_pct:   f64,
    pub current_revenue:     f64,
    pub new_revenue:         f64,
    pub revenue_impact_pct:  f64,
    pub incremental_revenue: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub summary: SimulationSummary,
    pub detail:  Vec<SimulationRow>,
}

#[derive(Default)]
struct GroupAcc {
    price:                       f64,
    competitor_price:            f64,
    distribution:                f64,
    price_elasticity:            f64,
    competitor_price_elasticity: f64,
    distribution_elasticity:     f64,
    volume:                      f64,
    rows:                        usize,
}

/// Project new volume and revenue for a filtered baseline subset.
///
/// Per (manufacturer, brand, retailer, ppg, year) group: mean price,
/// competitor price, distribution, and elasticities; summed volume. The
/// adjustment resolves against each group's own base values, every
/// percentage term is division-guarded, and an empty subset yields a
/// zero-filled summary with no detail rows.
pub fn simulate(subset: &[SalesRecord], adjustment: &SimulationAdjustment) -> SimulationResult {
    let mut groups: BTreeMap<(String, String, String, String, Year), GroupAcc> = BTreeMap::new();
    for r in subset {
        let key = (
            r.manufacturer.clone(),
            r.brand.clone(),
            r.retailer.clone(),
            r.ppg.clone(),
            r.year,
        );
        let acc = groups.entry(key).or_default();
        acc.price += r.price;
        acc.competitor_price += r.competitor_price;
        acc.distribution += r.distribution;
        acc.price_elasticity += r.price_elasticity;
        acc.competitor_price_elasticity += r.competitor_price_elasticity;
        acc.distribution_elasticity += r.distribution_elasticity;
        acc.volume += r.volume;
        acc.rows += 1;
    }

    let mut detail = Vec::with_capacity(groups.len());
    for ((manufacturer, brand, retailer, ppg, year), acc) in groups {
        let n = acc.rows as f64;
        let base_price = acc.price / n;
        let base_comp = acc.competitor_price / n;
        let base_dist = acc.distribution / n;
        let price_elasticity = acc.price_elasticity / n;
        let competitor_price_elasticity = acc.competitor_price_elasticity / n;
        let distribution_elasticity = acc.distribution_elasticity / n;
        let volume = acc.volume;

        let new_price = adjustment.price.resolve(base_price);
        let new_comp = adjustment.competitor_price.resolve(base_comp);
        let new_dist = adjustment.distribution.resolve(base_dist);

        let price_pct = pct_change(new_price, base_price);
        let comp_pct = pct_change(new_comp, base_comp);
        let dist_pct = pct_change(new_dist, base_dist);

        let relative_volume_change = price_pct * price_elasticity
            + comp_pct * competitor_price_elasticity
            + dist_pct * distribution_elasticity;

        let new_volume = volume * (1.0 + relative_volume_change);
        let old_revenue = volume * base_price;
        let new_revenue = new_volume * new_price;

        detail.push(SimulationRow {
            manufacturer,
            brand,
            retailer,
            ppg,
            year,
            price_elasticity,
            competitor_price_elasticity,
            distribution_elasticity,
            price: base_price,
            new_price,
            price_change_pct: price_pct * 100.0,
            competitor_price: base_comp,
            new_competitor_price: new_comp,
            competitor_price_change_pct: comp_pct * 100.0,
            distribution: base_dist,
            new_distribution: new_dist,
            distribution_change_pct: dist_pct * 100.0,
            volume,
            new_volume,
            volume_impact_pct: relative_volume_change * 100.0,
            old_revenue,
            new_revenue,
            incremental_revenue: new_revenue - old_revenue,
        });
    }

    let current_volume: f64 = detail.iter().map(|r| r.volume).sum();
    let new_volume: f64 = detail.iter().map(|r| r.new_volume).sum();
    let current_revenue: f64 = detail.iter().map(|r| r.old_revenue).sum();
    let new_revenue: f64 = detail.iter().map(|r| r.new_revenue).sum();

    let summary = SimulationSummary {
        current_volume,
        new_volume,
        volume_impact_pct: pct_change(new_volume, current_volume) * 100.0,
        current_revenue,
        new_revenue,
        revenue_impact_pct: pct_change(new_revenue, current_revenue) * 100.0,
        incremental_revenue: new_revenue - current_revenue,
    };

    log::debug!(
        "simulator: {} groups, volume {:.1} -> {:.1}",
        detail.len(),
        summary.current_volume,
        summary.new_volume
    );

    SimulationResult { summary, detail }
}
