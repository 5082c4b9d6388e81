//! Engine facade — binds the loaded dataset and configuration to the pure
//! analytics operations.
//!
//! The engine owns an immutable dataset snapshot. There is no shared
//! mutable state: every call filters and aggregates into freshly allocated
//! structures, so callers may hold one engine per process and serve
//! requests from it sequentially.

use crate::{
    config::NormalizeConfig,
    dataset::{Dataset, SalesRecord},
    elasticity::{self, ElasticityComparison, GroupField, RevenueShare},
    error::AnalyticsResult,
    filter::{self, FilterCriteria, FilterOptions},
    promotion::{self, PromotionEvent, PromotionSimulation},
    simulator::{self, SimulationAdjustment, SimulationResult},
};

pub struct AnalyticsEngine {
    config:  NormalizeConfig,
    dataset: Dataset,
}

impl AnalyticsEngine {
    /// Load configuration and dataset from a data directory.
    pub fn load(data_dir: &str) -> AnalyticsResult<Self> {
        let config = NormalizeConfig::load(data_dir)?;
        let dataset = Dataset::load(data_dir, &config)?;
        Ok(Self { config, dataset })
    }

    /// Build an engine over in-memory records with default normalization.
    /// Used by tests and embedding callers.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let config = NormalizeConfig::default();
        let dataset = Dataset::from_records(records, &config);
        Self { config, dataset }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.dataset.records
    }

    pub fn apply_filters(&self, criteria: &FilterCriteria) -> Vec<SalesRecord> {
        filter::apply_filters(&self.dataset.records, criteria)
    }

    /// Option lists for the filtered scope, with tactics reordered into
    /// the configured canonical display order.
    pub fn build_options(&self, criteria: &FilterCriteria) -> FilterOptions {
        let mut options = filter::build_options(&self.dataset.records, criteria);
        self.config.sort_tactics(&mut options.tactics);
        options
    }

    /// Benchmark-vs-selection elasticity comparison for the filtered scope.
    pub fn compute_elasticity(&self, criteria: &FilterCriteria) -> ElasticityComparison {
        let filtered = self.apply_filters(criteria);
        elasticity::compute_elasticity(&filtered, &self.dataset.records)
    }

    /// Revenue "fair share" per value of `field`, for the filtered scope
    /// and for the full category (benchmark).
    pub fn revenue_share(
        &self,
        criteria: &FilterCriteria,
        field: GroupField,
    ) -> (Vec<RevenueShare>, Vec<RevenueShare>) {
        let filtered = self.apply_filters(criteria);
        (
            elasticity::revenue_share(&filtered, field),
            elasticity::revenue_share(&self.dataset.records, field),
        )
    }

    pub fn simulate(
        &self,
        criteria: &FilterCriteria,
        adjustment: &SimulationAdjustment,
    ) -> SimulationResult {
        let filtered = self.apply_filters(criteria);
        simulator::simulate(&filtered, adjustment)
    }

    pub fn simulate_promotions(
        &self,
        criteria: &FilterCriteria,
        events: &[PromotionEvent],
    ) -> PromotionSimulation {
        promotion::run_promotion_simulation(&self.dataset.records, criteria, events)
    }
}
