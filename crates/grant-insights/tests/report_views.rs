use grant_insights::columns::GENDER;
use grant_insights::dataset::{DatasetSource, FileSource};
use grant_insights::{CleanedDatasetCache, GrantReport};
use std::sync::Arc;

fn fixture_bytes() -> Vec<u8> {
    FileSource::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/grant_requests.csv"
    ))
    .fetch()
    .expect("fixture readable")
}

#[test]
fn cached_dataset_drives_the_year_views() {
    let cache = CleanedDatasetCache::default();
    let bytes = fixture_bytes();
    let (_, dataset) = cache.get_or_clean(&bytes).expect("clean");
    let (_, again) = cache.get_or_clean(&bytes).expect("clean");
    assert!(Arc::ptr_eq(&dataset, &again));

    let report = GrantReport::new(&dataset.table);
    assert_eq!(report.available_years(), vec![2023, 2024]);

    let summary = report.for_year(2023);
    assert_eq!(summary.grants, 5);

    let gender = summary
        .demographics
        .iter()
        .find(|breakout| breakout.column == GENDER)
        .expect("gender breakout");
    let totals: Vec<(&str, usize, Option<f64>)> = gender
        .rows
        .iter()
        .map(|row| (row.category.as_str(), row.grants, row.total_amount))
        .collect();
    assert_eq!(
        totals,
        vec![
            ("female", 3, Some(425.0)),
            ("male", 1, None),
            ("transgender", 1, Some(0.0)),
        ]
    );
}

#[test]
fn balances_are_counted_per_patient() {
    let cache = CleanedDatasetCache::default();
    let (_, dataset) = cache.get_or_clean(&fixture_bytes()).expect("clean");
    let view = GrantReport::new(&dataset.table)
        .remaining_balance(2023)
        .expect("balance column present");

    assert_eq!(view.used_all.patients, 1);
    assert_eq!(view.remaining.patients, 2);
    let remaining: Vec<Option<&str>> = view
        .remaining
        .balances
        .iter()
        .map(|balance| balance.patient_id.as_deref())
        .collect();
    assert_eq!(remaining, vec![Some("2002"), Some("2003")]);
}

#[test]
fn later_year_views() {
    let cache = CleanedDatasetCache::default();
    let (_, dataset) = cache.get_or_clean(&fixture_bytes()).expect("clean");
    let report = GrantReport::new(&dataset.table);

    let timing = report.time_to_support(2024).expect("dates present");
    assert_eq!(timing.count, 2);
    assert_eq!(timing.average_days, Some(10.0));
    assert_eq!(timing.min_days, Some(1));
    assert_eq!(timing.max_days, Some(19));

    let pending = report.pending_signatures(2024).expect("columns present");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].patient_id.as_deref(), Some("2006"));
    assert_eq!(pending[0].application_signed.as_deref(), Some("no"));
}
