//! Filter engine — predicate application and cascading option lists.
//!
//! Filters compose by conjunction across fields and disjunction within a
//! field's value list. The sentinel "All" (or an absent/empty list) means no
//! restriction. Both entry points are pure functions of (table, criteria);
//! an empty result is a valid output, never an error.

use crate::{
    dataset::SalesRecord,
    types::{Month, Year},
};
use serde::{Deserialize, Serialize};

pub const ALL_SENTINEL: &str = "All";

/// Optional predicates per field. `None`, an empty list, or a list
/// containing the "All" sentinel all mean "no restriction".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub manufacturers: Option<Vec<String>>,
    pub brands:        Option<Vec<String>>,
    pub ppgs:          Option<Vec<String>>,
    pub retailers:     Option<Vec<String>>,
    pub years:         Option<Vec<Year>>,
    pub months:        Option<Vec<Month>>,
}

/// Valid values per field, conditioned on upstream selections in the
/// cascade chain manufacturer → brand → ppg → retailer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub manufacturers: Vec<String>,
    pub brands:        Vec<String>,
    pub ppgs:          Vec<String>,
    pub retailers:     Vec<String>,
    pub years:         Vec<Year>,
    pub months:        Vec<Month>,
    /// Distinct promo tactics in the filtered scope, alphabetical here;
    /// the engine reorders them into the canonical display order.
    pub tactics:       Vec<String>,
}

fn restricts(values: &Option<Vec<String>>) -> bool {
    match values {
        Some(list) => {
            !list.is_empty() && !list.iter().any(|v| v.eq_ignore_ascii_case(ALL_SENTINEL))
        }
        None => false,
    }
}

fn matches_list(value: &str, values: &Option<Vec<String>>) -> bool {
    if !restricts(values) {
        return true;
    }
    values
        .as_ref()
        .map(|list| list.iter().any(|v| v == value))
        .unwrap_or(true)
}

fn matches_numeric<T: PartialEq>(value: T, values: &Option<Vec<T>>) -> bool {
    match values {
        Some(list) if !list.is_empty() => list.contains(&value),
        _ => true,
    }
}

fn matches(record: &SalesRecord, criteria: &FilterCriteria) -> bool {
    matches_list(&record.manufacturer, &criteria.manufacturers)
        && matches_list(&record.brand, &criteria.brands)
        && matches_list(&record.ppg, &criteria.ppgs)
        && matches_list(&record.retailer, &criteria.retailers)
        && matches_numeric(record.year, &criteria.years)
        && matches_numeric(record.month, &criteria.months)
}

/// Return the rows satisfying every active predicate. Idempotent.
pub fn apply_filters(records: &[SalesRecord], criteria: &FilterCriteria) -> Vec<SalesRecord> {
    let filtered: Vec<SalesRecord> = records
        .iter()
        .filter(|r| matches(r, criteria))
        .cloned()
        .collect();
    log::debug!(
        "filter: {} of {} rows match criteria",
        filtered.len(),
        records.len()
    );
    filtered
}

fn distinct_strings<'a>(
    records: &[&'a SalesRecord],
    field: impl Fn(&'a SalesRecord) -> &'a str,
) -> Vec<String> {
    let mut values: Vec<String> = records.iter().map(|r| field(*r).to_string()).collect();
    values.sort();
    values.dedup();
    values
}

/// Compute the valid option lists for each field.
///
/// The cascade is a fixed dependency chain: the options for field N are
/// computed from the table filtered by fields 1..N-1 only — never by field
/// N's own current selection, so a user can always broaden a downstream
/// choice without it collapsing to empty. Years and months sit outside the
/// chain: both are scoped by the full categorical selection but not by
/// each other.
pub fn build_options(records: &[SalesRecord], criteria: &FilterCriteria) -> FilterOptions {
    let mut working: Vec<&SalesRecord> = records.iter().collect();
    let mut options = FilterOptions::default();

    options.manufacturers = distinct_strings(&working, |r| &r.manufacturer);
    if restricts(&criteria.manufacturers) {
        working.retain(|r| matches_list(&r.manufacturer, &criteria.manufacturers));
    }

    options.brands = distinct_strings(&working, |r| &r.brand);
    if restricts(&criteria.brands) {
        working.retain(|r| matches_list(&r.brand, &criteria.brands));
    }

    options.ppgs = distinct_strings(&working, |r| &r.ppg);
    if restricts(&criteria.ppgs) {
        working.retain(|r| matches_list(&r.ppg, &criteria.ppgs));
    }

    options.retailers = distinct_strings(&working, |r| &r.retailer);
    if restricts(&criteria.retailers) {
        working.retain(|r| matches_list(&r.retailer, &criteria.retailers));
    }

    options.years = {
        let mut years: Vec<Year> = working.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    };
    options.months = {
        let mut months: Vec<Month> = working.iter().map(|r| r.month).collect();
        months.sort_unstable();
        months.dedup();
        months
    };
    options.tactics = distinct_strings(&working, |r| &r.promo_tactic);
    options.tactics.retain(|t| !t.is_empty());

    options
}
