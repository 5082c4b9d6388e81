use rgm_core::dataset::SalesRecord;
use rgm_core::engine::AnalyticsEngine;
use rgm_core::filter::{apply_filters, build_options, FilterCriteria};

fn rec(manufacturer: &str, brand: &str, ppg: &str, retailer: &str, year: i32) -> SalesRecord {
    SalesRecord {
        manufacturer: manufacturer.into(),
        brand: brand.into(),
        ppg: ppg.into(),
        retailer: retailer.into(),
        year,
        month: 6,
        volume: 100.0,
        revenue: 500.0,
        ..SalesRecord::default()
    }
}

fn sample_table() -> Vec<SalesRecord> {
    vec![
        rec("Acme", "Shine", "PPG-1", "KROGER", 2023),
        rec("Acme", "Shine", "PPG-2", "TARGET", 2023),
        rec("Acme", "Gleam", "PPG-3", "KROGER", 2024),
        rec("Bolt", "Spark", "PPG-4", "PUBLIX", 2024),
        rec("Bolt", "Spark", "PPG-4", "TARGET", 2024),
    ]
}

#[test]
fn conjunction_across_fields() {
    let table = sample_table();
    let criteria = FilterCriteria {
        manufacturers: Some(vec!["Acme".into()]),
        retailers: Some(vec!["KROGER".into()]),
        ..FilterCriteria::default()
    };

    let filtered = apply_filters(&table, &criteria);
    assert_eq!(filtered.len(), 2);
    assert!(filtered
        .iter()
        .all(|r| r.manufacturer == "Acme" && r.retailer == "KROGER"));
}

#[test]
fn all_sentinel_means_no_restriction() {
    let table = sample_table();
    let with_sentinel = FilterCriteria {
        brands: Some(vec!["All".into()]),
        ..FilterCriteria::default()
    };

    let filtered = apply_filters(&table, &with_sentinel);
    assert_eq!(filtered.len(), table.len());
}

#[test]
fn filtering_is_idempotent() {
    let table = sample_table();
    let criteria = FilterCriteria {
        brands: Some(vec!["Spark".into()]),
        years: Some(vec![2024]),
        ..FilterCriteria::default()
    };

    let once = apply_filters(&table, &criteria);
    let twice = apply_filters(&once, &criteria);
    assert_eq!(once, twice);
}

#[test]
fn empty_result_is_not_an_error() {
    let table = sample_table();
    let criteria = FilterCriteria {
        brands: Some(vec!["Nonexistent".into()]),
        ..FilterCriteria::default()
    };

    let filtered = apply_filters(&table, &criteria);
    assert!(filtered.is_empty());

    // Downstream consumers must handle zero rows without raising.
    let options = build_options(&filtered, &FilterCriteria::default());
    assert!(options.brands.is_empty());
    assert!(options.years.is_empty());
}

#[test]
fn options_scoped_by_upstream_fields_only() {
    let table = sample_table();
    let criteria = FilterCriteria {
        brands: Some(vec!["Shine".into()]),
        ..FilterCriteria::default()
    };

    let options = build_options(&table, &criteria);
    // Brand options come from the table narrowed by manufacturer only —
    // never by the brand selection itself.
    assert_eq!(options.brands, ["Gleam", "Shine", "Spark"]);
    // Downstream fields are narrowed by the brand selection.
    assert_eq!(options.ppgs, ["PPG-1", "PPG-2"]);
    assert_eq!(options.retailers, ["KROGER", "TARGET"]);
    assert_eq!(options.years, [2023]);
}

#[test]
fn broadening_never_shrinks_options() {
    let table = sample_table();
    let narrow = FilterCriteria {
        manufacturers: Some(vec!["Acme".into()]),
        brands: Some(vec!["Shine".into()]),
        ..FilterCriteria::default()
    };
    let broad = FilterCriteria {
        manufacturers: Some(vec!["Acme".into()]),
        brands: Some(vec!["All".into()]),
        ..FilterCriteria::default()
    };

    let narrow_opts = build_options(&table, &narrow);
    let broad_opts = build_options(&table, &broad);

    for value in &narrow_opts.ppgs {
        assert!(broad_opts.ppgs.contains(value), "ppg {value} lost on broadening");
    }
    for value in &narrow_opts.retailers {
        assert!(
            broad_opts.retailers.contains(value),
            "retailer {value} lost on broadening"
        );
    }
    for value in &narrow_opts.years {
        assert!(broad_opts.years.contains(value), "year {value} lost on broadening");
    }
}

#[test]
fn tactic_options_follow_canonical_display_order() {
    let mut table = sample_table();
    for (record, tactic) in table
        .iter_mut()
        .zip(["Feature", "Bonus Pack", "TPR", "Display"])
    {
        record.promo_tactic = tactic.into();
    }
    // Fifth row keeps an empty tactic; it must not appear as an option.
    let engine = AnalyticsEngine::from_records(table);

    let options = engine.build_options(&FilterCriteria::default());
    assert_eq!(options.tactics, ["TPR", "Display", "Feature", "Bonus Pack"]);
}

#[test]
fn engine_facade_filters_and_builds_options() {
    let engine = AnalyticsEngine::from_records(sample_table());

    let criteria = FilterCriteria {
        retailers: Some(vec!["TARGET".into()]),
        ..FilterCriteria::default()
    };
    assert_eq!(engine.apply_filters(&criteria).len(), 2);

    let options = engine.build_options(&FilterCriteria::default());
    assert_eq!(options.manufacturers, ["Acme", "Bolt"]);
    assert_eq!(options.years, [2023, 2024]);
}
