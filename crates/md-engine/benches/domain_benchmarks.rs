//! Benchmarks for histogram bucketing and domain paging.
//!
//! Run with: cargo bench --package md-engine
//! Or: cargo bench --package md-engine --bench domain_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use md_common::BoundingBox;
use md_engine::{
    DimensionDescriptor, DimensionValue, DomainPager, DomainResult, FeatureStore,
    HistogramBuilder, HistogramStrategy, PageRequest, Predicate, Record, Resolution, SortOrder,
    ValueKind, ValueRange,
};
use test_utils::{create_hourly_instants, create_interval_series, create_value_series};

fn intervals(count: usize) -> DomainResult {
    DomainResult::IntervalSet(
        create_interval_series(count, 10_000.0, 200.0, 42)
            .into_iter()
            .filter_map(|(start, end)| ValueRange::new(start.into(), end.into()).ok())
            .collect(),
    )
}

fn values(count: usize) -> DomainResult {
    let mut values: Vec<DimensionValue> = create_value_series(count, 5_000, 42)
        .into_iter()
        .map(DimensionValue::Integer)
        .collect();
    values.sort();
    values.dedup();
    DomainResult::ValueSet(values)
}

// =============================================================================
// HISTOGRAM BENCHMARKS
// =============================================================================

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");
    let builder = HistogramBuilder::new(HistogramStrategy::InMemory, 10_000);
    let resolution = Resolution::Numeric(10.0);

    for count in [1_000usize, 10_000] {
        let samples = intervals(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("ranges", count), &samples, |b, samples| {
            b.iter(|| builder.build(black_box(samples), Some(&resolution), None))
        });
    }

    let instants = DomainResult::ValueSet(
        create_hourly_instants(5_000)
            .iter()
            .filter_map(|s| ValueKind::Time.parse(s).ok())
            .collect(),
    );
    let daily = Resolution::parse("P1D").ok();
    group.bench_function("hourly_instants_daily_buckets", |b| {
        b.iter(|| builder.build(black_box(&instants), daily.as_ref(), None))
    });

    group.finish();
}

fn bench_delegated_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram_delegated");
    let footprint = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    let mut store = FeatureStore::new("bench");
    for (start, end) in create_interval_series(2_000, 1_000.0, 50.0, 7) {
        store.insert(
            Record::new("", footprint)
                .with_attribute("start", start)
                .with_attribute("end", end),
        );
    }
    let descriptor = DimensionDescriptor::range("elevation", "start", "end", ValueKind::Float);
    let resolution = Resolution::Numeric(50.0);

    for strategy in [HistogramStrategy::InMemory, HistogramStrategy::Delegated] {
        let builder = HistogramBuilder::new(strategy, 10_000);
        group.bench_function(format!("{:?}", strategy), |b| {
            b.iter(|| {
                builder.compute(
                    &store,
                    &descriptor,
                    black_box(&Predicate::Include),
                    Some(&resolution),
                    None,
                )
            })
        });
    }

    group.finish();
}

// =============================================================================
// PAGING BENCHMARKS
// =============================================================================

fn bench_paging(c: &mut Criterion) {
    let mut group = c.benchmark_group("paging");
    let pager = DomainPager::new(1_000, 100_000);

    let domain = values(50_000);
    group.bench_function("values_first_page", |b| {
        let request = PageRequest::new().with_limit(100);
        b.iter(|| pager.page(black_box(domain.clone()), &request))
    });

    group.bench_function("values_descending_from_cursor", |b| {
        let request = PageRequest::new()
            .with_limit(100)
            .with_sort(SortOrder::Descending)
            .with_from_value(2_500i64);
        b.iter(|| pager.page(black_box(domain.clone()), &request))
    });

    let ranges = intervals(10_000);
    group.bench_function("ranges_from_end", |b| {
        let request = PageRequest::new()
            .with_limit(100)
            .with_from_value(5_000.0)
            .with_from_end(true);
        b.iter(|| pager.page(black_box(ranges.clone()), &request))
    });

    group.finish();
}

criterion_group!(benches, bench_histogram, bench_delegated_histogram, bench_paging);
criterion_main!(benches);
