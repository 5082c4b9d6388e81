//! Promotion event scheduler and aggregator.
//!
//! Each promotion event replays one specific historical promotional pattern:
//! its predicates are exact matches over the promo columns of the globally
//! filtered table. Complete events contribute an incremental-volume step to
//! the waterfall and an ROI figure; incomplete events report ROI 0 but keep
//! their position in the per-event output so indexing stays stable. The
//! calendar entries and week grid are scheduling/visualization aids with no
//! effect on the financial aggregates.

use crate::{
    dataset::{snap_to_week_start, SalesRecord},
    filter::{apply_filters, FilterCriteria},
    types::safe_ratio,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WEEKS_PER_YEAR: usize = 52;

/// A discrete promotional event to replay. Complete only when every field
/// is supplied (non-empty lists, all scalars present).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionEvent {
    pub tactics:         Vec<String>,
    pub offer_types:     Vec<String>,
    pub offer_mechanics: Vec<String>,
    pub start_date:      Option<NaiveDate>,
    pub duration_days:   Option<u32>,
    pub discount:        Option<f64>,
    /// Fraction in [0, 1]. When supplied, overwrites (not blends) the
    /// redemption-rate column on this event's rows.
    pub redemption_rate: Option<f64>,
}

impl PromotionEvent {
    pub fn is_complete(&self) -> bool {
        !self.tactics.is_empty()
            && !self.offer_types.is_empty()
            && !self.offer_mechanics.is_empty()
            && self.start_date.is_some()
            && self.duration_days.is_some()
            && self.discount.is_some()
            && self.redemption_rate.is_some()
    }
}

/// Per-event result at the event's original index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub index:              usize,
    pub complete:           bool,
    pub matched_rows:       usize,
    pub incremental_volume: f64,
    pub roi:                f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallMeasure {
    Absolute,
    Relative,
    Total,
}

/// Waterfall decomposition: baseline + one relative step per complete
/// event = total. Labels, values, and measures always have equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waterfall {
    pub labels:   Vec<String>,
    pub values:   Vec<f64>,
    pub measures: Vec<WaterfallMeasure>,
}

/// One calendar entry per event that has a start date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub title: String,
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

/// Sparse event × ISO-week occupancy grid. A cell holds the number of days
/// the event occupies in that week, `None` where the event does not touch
/// the week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekGridRow {
    pub event: String,
    pub cells: Vec<Option<u8>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeekGrid {
    pub rows: Vec<WeekGridRow>,
}

/// One drill-through row: a product/event grouping with summed financials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillRow {
    pub retailer:        String,
    pub brand:           String,
    pub manufacturer:    String,
    pub ppg:             String,
    pub promo_tactic:    String,
    pub offer_mechanic:  String,
    pub offer_type:      String,
    pub week_start:      Option<NaiveDate>,
    pub duration_days:   u32,
    pub discount:        f64,
    pub redemption_rate: f64,

    pub incremental_volume: f64,
    pub volume_uplift_pct:  f64,
    pub roi:                f64,
    pub baseline:           f64,
    pub promo_investment:   f64,
    pub incr_revenue:       f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionSimulation {
    pub event_outcomes: Vec<EventOutcome>,
    pub waterfall:      Waterfall,
    pub calendar:       Vec<CalendarEntry>,
    pub week_grid:      WeekGrid,
    pub drill_rows:     Vec<DrillRow>,
}

fn matches_event(record: &SalesRecord, event: &PromotionEvent) -> bool {
    if !event.tactics.is_empty() && !event.tactics.contains(&record.promo_tactic) {
        return false;
    }
    if !event.offer_types.is_empty() && !event.offer_types.contains(&record.offer_type) {
        return false;
    }
    if !event.offer_mechanics.is_empty()
        && !event.offer_mechanics.contains(&record.offer_mechanic)
    {
        return false;
    }
    if let Some(start) = event.start_date {
        if record.promo_week_start != Some(snap_to_week_start(start)) {
            return false;
        }
    }
    if let Some(days) = event.duration_days {
        if record.promo_duration_days != days {
            return false;
        }
    }
    if let Some(discount) = event.discount {
        if record.discount != discount {
            return false;
        }
    }
    true
}

/// Derive this event's row subset from the shared base table. The rows are
/// cloned; a supplied redemption rate overwrites the column on the clones
/// only.
fn event_rows(base: &[SalesRecord], event: &PromotionEvent) -> Vec<SalesRecord> {
    let mut rows: Vec<SalesRecord> = base
        .iter()
        .filter(|r| matches_event(r, event))
        .cloned()
        .collect();
    if let Some(rate) = event.redemption_rate {
        for row in &mut rows {
            row.redemption_rate = rate;
        }
    }
    rows
}

/// Baseline for the globally-filtered scope, taken once per product/week
/// group (first value, so duplicate baseline rows are not double-counted).
fn baseline_volume(base: &[SalesRecord]) -> f64 {
    let mut firsts: BTreeMap<(String, String, String, String, Option<NaiveDate>), f64> =
        BTreeMap::new();
    for r in base {
        firsts
            .entry((
                r.ppg.clone(),
                r.brand.clone(),
                r.retailer.clone(),
                r.manufacturer.clone(),
                r.start_date,
            ))
            .or_insert(r.baseline_volume);
    }
    firsts.values().sum()
}

/// Days of `[start, start + duration]` (inclusive) falling in each ISO week.
///
/// Weeks strictly between the boundary weeks are fully occupied (7 days).
/// Both boundary weeks get the exact day count within that week, anchored
/// to the Monday-based week containing the boundary date. Ranges that wrap
/// the ISO-week year are not spanned.
fn week_occupancy(start: NaiveDate, duration_days: u32) -> Vec<(u32, u8)> {
    let end = start + Duration::days(duration_days as i64);
    let start_week = start.iso_week().week();
    let end_week = end.iso_week().week();

    if start_week == end_week {
        let days = (duration_days + 1).min(7) as u8;
        return vec![(start_week, days)];
    }
    if end_week < start_week {
        // Year wrap; report only the boundary weeks' partial counts.
        let head = 7 - start.weekday().num_days_from_monday() as u8;
        let tail = end.weekday().num_days_from_monday() as u8 + 1;
        return vec![(start_week, head), (end_week, tail)];
    }

    let mut occupancy = Vec::new();
    for week in start_week..=end_week {
        if week == start_week {
            let days = 7 - start.weekday().num_days_from_monday() as u8;
            occupancy.push((week, days));
        } else if week == end_week {
            let days = end.weekday().num_days_from_monday() as u8 + 1;
            occupancy.push((week, days));
        } else {
            occupancy.push((week, 7));
        }
    }
    occupancy
}

fn build_week_grid(events: &[PromotionEvent]) -> WeekGrid {
    let mut rows = Vec::new();
    for (i, event) in events.iter().enumerate() {
        let Some(start) = event.start_date else { continue };

        let mut cells: Vec<Option<u8>> = vec![None; WEEKS_PER_YEAR];
        let duration = event.duration_days.unwrap_or(0);
        for (week, days) in week_occupancy(start, duration) {
            let idx = week as usize - 1;
            if idx < WEEKS_PER_YEAR {
                cells[idx] = Some(days);
            }
        }
        rows.push(WeekGridRow {
            event: format!("Promo {}", i + 1),
            cells,
        });
    }
    WeekGrid { rows }
}

fn build_calendar(events: &[PromotionEvent]) -> Vec<CalendarEntry> {
    events
        .iter()
        .enumerate()
        .filter_map(|(i, event)| {
            let start = event.start_date?;
            let end = match event.duration_days {
                Some(days) => start + Duration::days(days as i64),
                None => start,
            };
            Some(CalendarEntry {
                title: format!("Promo {}", i + 1),
                start,
                end,
            })
        })
        .collect()
}

fn event_roi(rows: &[SalesRecord]) -> f64 {
    let investment: f64 = rows.iter().map(|r| r.promo_investment).sum();
    if investment == 0.0 {
        return 0.0;
    }
    let incr_revenue: f64 = rows.iter().map(|r| r.incr_revenue).sum();
    incr_revenue / investment + 1.0
}

#[derive(Default)]
struct DrillAcc {
    incremental_volume: f64,
    baseline:           f64,
    promo_investment:   f64,
    incr_revenue:       f64,
}

fn build_drill_rows(rows_per_event: &[(bool, Vec<SalesRecord>)]) -> Vec<DrillRow> {
    type DrillKey = (
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        Option<NaiveDate>,
        u32,
        // discount and redemption rate, kept as bit patterns so the key
        // stays Ord; converted back when emitting.
        u64,
        u64,
    );

    let mut groups: BTreeMap<DrillKey, DrillAcc> = BTreeMap::new();
    for (complete, rows) in rows_per_event {
        if !*complete {
            continue;
        }
        for r in rows {
            let key = (
                r.retailer.clone(),
                r.brand.clone(),
                r.manufacturer.clone(),
                r.ppg.clone(),
                r.promo_tactic.clone(),
                r.offer_mechanic.clone(),
                r.offer_type.clone(),
                r.promo_week_start,
                r.promo_duration_days,
                r.discount.to_bits(),
                r.redemption_rate.to_bits(),
            );
            let acc = groups.entry(key).or_default();
            acc.incremental_volume += r.incremental_volume;
            acc.baseline += r.baseline_volume;
            acc.promo_investment += r.promo_investment;
            acc.incr_revenue += r.incr_revenue;
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let (
                retailer,
                brand,
                manufacturer,
                ppg,
                promo_tactic,
                offer_mechanic,
                offer_type,
                week_start,
                duration_days,
                discount_bits,
                redemption_bits,
            ) = key;
            DrillRow {
                retailer,
                brand,
                manufacturer,
                ppg,
                promo_tactic,
                offer_mechanic,
                offer_type,
                week_start,
                duration_days,
                discount: f64::from_bits(discount_bits),
                redemption_rate: f64::from_bits(redemption_bits),
                incremental_volume: acc.incremental_volume,
                volume_uplift_pct: safe_ratio(acc.incremental_volume, acc.baseline) * 100.0,
                roi: if acc.promo_investment == 0.0 {
                    0.0
                } else {
                    acc.incr_revenue / acc.promo_investment + 1.0
                },
                baseline: acc.baseline,
                promo_investment: acc.promo_investment,
                incr_revenue: acc.incr_revenue,
            }
        })
        .collect()
}

/// Run the multi-event promotion simulation.
///
/// Each event independently derives its row subset from the globally
/// filtered base table; complete events feed the waterfall in event order,
/// incomplete ones are skipped there but still occupy their index in
/// `event_outcomes`.
pub fn run_promotion_simulation(
    records: &[SalesRecord],
    global_criteria: &FilterCriteria,
    events: &[PromotionEvent],
) -> PromotionSimulation {
    let base = apply_filters(records, global_criteria);

    let rows_per_event: Vec<(bool, Vec<SalesRecord>)> = events
        .iter()
        .map(|event| (event.is_complete(), event_rows(&base, event)))
        .collect();

    let mut event_outcomes = Vec::with_capacity(events.len());
    for (index, (complete, rows)) in rows_per_event.iter().enumerate() {
        let incremental_volume: f64 = rows.iter().map(|r| r.incremental_volume).sum();
        let roi = if *complete { event_roi(rows) } else { 0.0 };
        if !*complete {
            log::debug!("promotion: event {index} incomplete, reporting ROI 0");
        }
        event_outcomes.push(EventOutcome {
            index,
            complete: *complete,
            matched_rows: rows.len(),
            incremental_volume,
            roi,
        });
    }

    let baseline = baseline_volume(&base);
    let mut labels = vec!["Baseline".to_string()];
    let mut values = vec![baseline];
    let mut measures = vec![WaterfallMeasure::Absolute];
    for outcome in event_outcomes.iter().filter(|o| o.complete) {
        labels.push(format!("Incremental Sales Promo{}", outcome.index + 1));
        values.push(outcome.incremental_volume);
        measures.push(WaterfallMeasure::Relative);
    }
    labels.push("Total".to_string());
    values.push(values.iter().sum());
    measures.push(WaterfallMeasure::Total);

    log::info!(
        "promotion: {} events ({} complete), baseline {:.1}, total {:.1}",
        events.len(),
        event_outcomes.iter().filter(|o| o.complete).count(),
        baseline,
        values.last().copied().unwrap_or(0.0)
    );

    PromotionSimulation {
        event_outcomes,
        waterfall: Waterfall {
            labels,
            values,
            measures,
        },
        calendar: build_calendar(events),
        week_grid: build_week_grid(events),
        drill_rows: build_drill_rows(&rows_per_event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_week_occupancy_is_capped() {
        // Tuesday 2024-06-11, 2 days -> inclusive range Tue..Thu, one week.
        let start = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert_eq!(week_occupancy(start, 2), vec![(24, 3)]);
        assert_eq!(week_occupancy(start, 20).len(), 4);
    }

    #[test]
    fn year_wrap_reports_boundary_partials_only() {
        // Friday 2024-12-27 (ISO week 52) + 5 days = Wednesday 2025-01-01
        // (ISO week 1). Fri..Sun = 3 days, Mon..Wed = 3 days.
        let start = NaiveDate::from_ymd_opt(2024, 12, 27).unwrap();
        assert_eq!(week_occupancy(start, 5), vec![(52, 3), (1, 3)]);
    }

    #[test]
    fn boundary_weeks_get_partial_counts() {
        // Thursday 2024-06-13 + 11 days = Monday 2024-06-24.
        // Week 24: Thu..Sun = 4 days, week 25: full, week 26: Mon = 1 day.
        let start = NaiveDate::from_ymd_opt(2024, 6, 13).unwrap();
        assert_eq!(week_occupancy(start, 11), vec![(24, 4), (25, 7), (26, 1)]);
    }
}
