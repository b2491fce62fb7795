//! Tests for data source failures, cancellation and strategy equivalence.

mod common;

use common::{quadrants_resource, quadrants_store, watertemp_index, watertemp_resource, Harness};
use md_common::BoundingBox;
use md_engine::{
    CancellationFlag, DataAccessError, DataSource, DomainConfig, DomainError, DomainValuesRequest,
    FeatureStore, HistogramRequest, HistogramStrategy, Predicate, Record,
};
use test_utils::create_interval_series;

/// A store whose backend is down.
struct UnreachableStore;

impl DataSource for UnreachableStore {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn query_records(&self, _predicate: &Predicate) -> Result<Vec<Record>, DataAccessError> {
        Err(DataAccessError::QueryFailed("connection refused".to_string()))
    }
}

// ============================================================================
// Failure propagation
// ============================================================================

#[test]
fn test_query_failure_propagates_unchanged() {
    let harness = Harness::new(quadrants_resource(true), UnreachableStore);
    let err = harness
        .engine()
        .domain_values(&DomainValuesRequest::new("elevation"))
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::DataAccess(DataAccessError::QueryFailed(_))
    ));
    assert_eq!(err.to_string(), "data source query failed: connection refused");
    assert_eq!(err.http_status_code(), 500);
    assert_eq!(err.exception_code(), "NoApplicableCode");
}

#[test]
fn test_cancellation_aborts_raster_histogram() {
    let flag = CancellationFlag::new();
    let harness = Harness::new(
        watertemp_resource(),
        watertemp_index().with_cancellation(flag.clone()),
    );
    flag.cancel();

    let err = harness
        .engine()
        .histogram(&HistogramRequest::new("elevation"))
        .unwrap_err();
    assert!(matches!(err, DomainError::DataAccess(DataAccessError::Cancelled)));
    assert_eq!(err.http_status_code(), 503);
}

#[test]
fn test_cancellation_aborts_vector_listing() {
    let flag = CancellationFlag::new();
    let harness = Harness::new(
        quadrants_resource(true),
        quadrants_store().with_cancellation(flag.clone()),
    );
    assert!(harness
        .engine()
        .domain_values(&DomainValuesRequest::new("time"))
        .is_ok());

    flag.cancel();
    assert!(harness
        .engine()
        .domain_values(&DomainValuesRequest::new("time"))
        .is_err());
}

// ============================================================================
// Strategy equivalence on generated data
// ============================================================================

fn generated_store() -> FeatureStore {
    let footprint = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);
    let mut store = FeatureStore::new("ElevationWithStartEnd");
    let intervals = create_interval_series(300, 500.0, 40.0, 11);
    for (start, end) in intervals {
        store.insert(
            Record::new("", footprint)
                .with_attribute("startElevation", start)
                .with_attribute("endElevation", end)
                .with_attribute("startTime", md_common::parse_instant("2012-02-11T00:00:00Z").unwrap())
                .with_attribute("endTime", md_common::parse_instant("2012-02-12T00:00:00Z").unwrap()),
        );
    }
    store
}

#[test]
fn test_strategies_agree_on_generated_ranges() {
    let mut histograms = Vec::new();
    for strategy in [HistogramStrategy::InMemory, HistogramStrategy::Delegated] {
        let harness = Harness::new(quadrants_resource(true), generated_store()).with_config(
            DomainConfig {
                histogram_strategy: strategy,
                ..Default::default()
            },
        );
        let request = HistogramRequest {
            resolution: Some("25".to_string()),
            ..HistogramRequest::new("elevation")
        };
        histograms.push(harness.engine().histogram(&request).unwrap());
    }
    assert_eq!(histograms[0], histograms[1]);
    assert!(histograms[0].values.iter().sum::<u64>() >= 300);
}
