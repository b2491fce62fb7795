//! Histograms over a dimension domain.
//!
//! Buckets are half-open, `[min + i*step, min + (i+1)*step)`, and there are as
//! many as needed for the maximum to fall inside the last one. For range
//! dimensions the maximum is taken from the end values and every bucket an
//! interval touches is incremented, so counts can add up to more than the
//! number of records.

use chrono::{DateTime, Utc};
use md_common::time::format_instant;
use md_common::Period;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dimension::DimensionDescriptor;
use crate::error::{DomainError, Result};
use crate::extractor::{DomainResult, DomainValueExtractor};
use crate::filter::{constraint_predicate, Constraint, Predicate};
use crate::range::ValueRange;
use crate::source::DataSource;
use crate::value::{format_number, DimensionValue, ValueKind};

/// Where bucket counts are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramStrategy {
    /// Materialize one sample per record and bucket them in the engine.
    #[default]
    InMemory,
    /// Derive bounds from distinct values and ask the source for one count
    /// per bucket.
    Delegated,
}

impl HistogramStrategy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in_memory" | "memory" => Some(Self::InMemory),
            "delegated" | "source" => Some(Self::Delegated),
            _ => None,
        }
    }
}

/// Bucket width: a number for linear dimensions, a period for temporal ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Numeric(f64),
    Period(Period),
}

impl Resolution {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with(['P', 'p']) {
            return Period::parse(s)
                .map(Resolution::Period)
                .map_err(|e| DomainError::invalid_resolution(e.to_string()));
        }
        match s.parse::<f64>() {
            Ok(step) if step.is_finite() && step > 0.0 => Ok(Resolution::Numeric(step)),
            Ok(_) => Err(DomainError::invalid_resolution(format!(
                "step must be a positive number: {}",
                s
            ))),
            Err(_) => Err(DomainError::invalid_resolution(format!(
                "not a number or ISO-8601 period: {}",
                s
            ))),
        }
    }
}

/// A computed histogram.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Histogram {
    /// `min/max/step`, `v1--v2` for a single-value domain, the value list for
    /// text dimensions, or empty.
    pub domain: String,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Counts joined by commas.
    pub fn values_string(&self) -> String {
        self.counts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Bucket layout derived from the domain bounds and the resolution.
#[derive(Debug)]
enum Buckets {
    Numeric { min: f64, step: f64, count: usize },
    /// `edges` has one more entry than there are buckets. `end` is the
    /// rendered upper bound: the data maximum when one period covers it all.
    Temporal {
        edges: Vec<DateTime<Utc>>,
        end: DateTime<Utc>,
        period: Period,
    },
    Text { values: Vec<DimensionValue> },
}

/// Where a value falls relative to the bucket range.
enum Slot {
    Below,
    In(usize),
    Above,
}

impl Buckets {
    fn count(&self) -> usize {
        match self {
            Buckets::Numeric { count, .. } => *count,
            Buckets::Temporal { edges, .. } => edges.len() - 1,
            Buckets::Text { values } => values.len(),
        }
    }

    fn slot(&self, value: &DimensionValue) -> Slot {
        match self {
            Buckets::Numeric { min, step, count } => {
                let Some(v) = value.as_f64() else {
                    return Slot::Above;
                };
                if v < *min {
                    return Slot::Below;
                }
                let idx = ((v - min) / step).floor() as usize;
                if idx >= *count {
                    Slot::Above
                } else {
                    Slot::In(idx)
                }
            }
            Buckets::Temporal { edges, .. } => {
                let Some(t) = value.as_time() else {
                    return Slot::Above;
                };
                let idx = edges.partition_point(|e| e <= t);
                if idx == 0 {
                    Slot::Below
                } else if idx >= edges.len() {
                    Slot::Above
                } else {
                    Slot::In(idx - 1)
                }
            }
            Buckets::Text { values } => match values.binary_search(value) {
                Ok(idx) => Slot::In(idx),
                Err(0) => Slot::Below,
                Err(_) => Slot::Above,
            },
        }
    }

    /// Buckets touched by `[low, high]`, if any.
    fn span(&self, low: &DimensionValue, high: &DimensionValue) -> Option<(usize, usize)> {
        if let Buckets::Text { values } = self {
            // text buckets are discrete, an interval touches the values it contains
            let first = values.partition_point(|v| v < low);
            let last = values.partition_point(|v| v <= high);
            return (first < last).then(|| (first, last - 1));
        }

        let last_bucket = self.count().checked_sub(1)?;
        let first = match self.slot(low) {
            Slot::Below => 0,
            Slot::In(i) => i,
            Slot::Above => return None,
        };
        let last = match self.slot(high) {
            Slot::Below => return None,
            Slot::In(i) => i,
            Slot::Above => last_bucket,
        };
        Some((first, last))
    }

    fn bucket_range(&self, idx: usize) -> Option<ValueRange<DimensionValue>> {
        match self {
            Buckets::Numeric { min, step, .. } => ValueRange::with_inclusivity(
                DimensionValue::Float(min + idx as f64 * step),
                DimensionValue::Float(min + (idx + 1) as f64 * step),
                true,
                false,
            )
            .ok(),
            Buckets::Temporal { edges, .. } => ValueRange::with_inclusivity(
                DimensionValue::Time(*edges.get(idx)?),
                DimensionValue::Time(*edges.get(idx + 1)?),
                true,
                false,
            )
            .ok(),
            Buckets::Text { values } => values.get(idx).cloned().map(ValueRange::point),
        }
    }

    fn domain(&self) -> String {
        match self {
            Buckets::Numeric { min, step, count } => format!(
                "{}/{}/{}",
                format_number(*min),
                format_number(min + *count as f64 * step),
                format_number(*step)
            ),
            Buckets::Temporal { edges, end, period } => match edges.first() {
                Some(first) => format!(
                    "{}/{}/{}",
                    format_instant(first),
                    format_instant(end),
                    period
                ),
                None => String::new(),
            },
            Buckets::Text { values } => values
                .iter()
                .map(DimensionValue::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Builds histograms with a fixed strategy and bucket ceiling.
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    strategy: HistogramStrategy,
    max_buckets: usize,
}

impl HistogramBuilder {
    pub fn new(strategy: HistogramStrategy, max_buckets: usize) -> Self {
        Self {
            strategy,
            max_buckets,
        }
    }

    pub fn strategy(&self) -> HistogramStrategy {
        self.strategy
    }

    /// Bucket per-record samples.
    ///
    /// `bounds` replaces the bounds derived from the samples; samples outside
    /// it are not counted.
    pub fn build(
        &self,
        samples: &DomainResult,
        resolution: Option<&Resolution>,
        bounds: Option<&ValueRange<DimensionValue>>,
    ) -> Result<Histogram> {
        let (Some(min), Some(max)) = domain_bounds(samples, bounds) else {
            return Ok(Histogram::empty());
        };
        let kind = min.kind();
        check_bounds_kind(kind, bounds)?;

        if min == max && kind != ValueKind::Text {
            let point = ValueRange::point(min.clone());
            let count = match samples {
                DomainResult::ValueSet(values) => {
                    values.iter().filter(|v| point.contains(v)).count()
                }
                DomainResult::IntervalSet(intervals) => {
                    intervals.iter().filter(|r| r.intersects(&point)).count()
                }
            };
            return Ok(single_bucket(&min, &max, count as u64));
        }

        let buckets = self.plan(kind, &min, &max, resolution, samples)?;
        let mut counts = vec![0u64; buckets.count()];

        let mut increment = |low: &DimensionValue, high: &DimensionValue| {
            if let Some((first, last)) = buckets.span(low, high) {
                for count in &mut counts[first..=last] {
                    *count += 1;
                }
            }
        };
        match samples {
            DomainResult::ValueSet(values) => values.iter().for_each(|v| increment(v, v)),
            DomainResult::IntervalSet(intervals) => intervals
                .iter()
                .for_each(|r| increment(r.low(), r.high())),
        }

        Ok(Histogram {
            domain: buckets.domain(),
            counts,
        })
    }

    /// Compute the histogram of `descriptor` over records matching
    /// `predicate`, using the configured strategy.
    pub fn compute(
        &self,
        source: &dyn DataSource,
        descriptor: &DimensionDescriptor,
        predicate: &Predicate,
        resolution: Option<&Resolution>,
        bounds: Option<&ValueRange<DimensionValue>>,
    ) -> Result<Histogram> {
        let extractor = DomainValueExtractor::new(source);
        match self.strategy {
            HistogramStrategy::InMemory => {
                let samples = extractor.extract_samples(descriptor, predicate)?;
                self.build(&samples, resolution, bounds)
            }
            HistogramStrategy::Delegated => {
                let distinct = extractor.extract(descriptor, predicate)?;
                self.delegate(source, descriptor, predicate, &distinct, resolution, bounds)
            }
        }
    }

    fn delegate(
        &self,
        source: &dyn DataSource,
        descriptor: &DimensionDescriptor,
        predicate: &Predicate,
        distinct: &DomainResult,
        resolution: Option<&Resolution>,
        bounds: Option<&ValueRange<DimensionValue>>,
    ) -> Result<Histogram> {
        let (Some(min), Some(max)) = domain_bounds(distinct, bounds) else {
            return Ok(Histogram::empty());
        };
        let kind = min.kind();
        check_bounds_kind(kind, bounds)?;

        let count_matching = |range: ValueRange<DimensionValue>| -> Result<u64> {
            let bucket = constraint_predicate(descriptor, &Constraint::Interval(range));
            let combined = Predicate::and([predicate.clone(), bucket]);
            Ok(source.count(&combined)? as u64)
        };

        if min == max && kind != ValueKind::Text {
            let count = count_matching(ValueRange::point(min.clone()))?;
            return Ok(single_bucket(&min, &max, count));
        }

        let buckets = self.plan(kind, &min, &max, resolution, distinct)?;
        let mut counts = Vec::with_capacity(buckets.count());
        for idx in 0..buckets.count() {
            let count = match buckets.bucket_range(idx) {
                Some(range) => count_matching(range)?,
                None => 0,
            };
            counts.push(count);
        }

        debug!(
            source = source.name(),
            dimension = descriptor.name(),
            buckets = counts.len(),
            "delegated histogram"
        );
        Ok(Histogram {
            domain: buckets.domain(),
            counts,
        })
    }

    fn plan(
        &self,
        kind: ValueKind,
        min: &DimensionValue,
        max: &DimensionValue,
        resolution: Option<&Resolution>,
        samples: &DomainResult,
    ) -> Result<Buckets> {
        let buckets = match kind {
            ValueKind::Integer | ValueKind::Float => {
                let step = match resolution {
                    None => 1.0,
                    Some(Resolution::Numeric(step)) => *step,
                    Some(Resolution::Period(p)) => {
                        return Err(DomainError::invalid_resolution(format!(
                            "period {} given for a numeric dimension",
                            p
                        )))
                    }
                };
                let (min, max) = (min.as_f64().unwrap_or(0.0), max.as_f64().unwrap_or(0.0));
                let count = ((max - min) / step).floor() + 1.0;
                if !count.is_finite() || count > self.max_buckets as f64 {
                    return Err(self.too_many_buckets());
                }
                Buckets::Numeric {
                    min,
                    step,
                    count: count as usize,
                }
            }
            ValueKind::Time => {
                let period = match resolution {
                    None => Period::parse("P1D")
                        .map_err(|e| DomainError::invalid_resolution(e.to_string()))?,
                    Some(Resolution::Period(p)) => p.clone(),
                    Some(Resolution::Numeric(step)) => {
                        return Err(DomainError::invalid_resolution(format!(
                            "numeric step {} given for a temporal dimension",
                            step
                        )))
                    }
                };
                let (Some(start), Some(end)) = (min.as_time(), max.as_time()) else {
                    return Err(DomainError::invalid_range("mixed value types in domain"));
                };
                let edges = self.period_edges(start, end, &period)?;
                let end = match edges.as_slice() {
                    [_, _] => *end,
                    _ => edges.last().copied().unwrap_or(*end),
                };
                Buckets::Temporal { edges, end, period }
            }
            ValueKind::Text => {
                if resolution.is_some() {
                    return Err(DomainError::invalid_resolution(
                        "text dimensions are bucketed by value and take no resolution",
                    ));
                }
                let range = ValueRange::new(min.clone(), max.clone())?;
                let mut values: Vec<DimensionValue> = match samples {
                    DomainResult::ValueSet(values) => values.clone(),
                    DomainResult::IntervalSet(intervals) => intervals
                        .iter()
                        .flat_map(|r| [r.low().clone(), r.high().clone()])
                        .collect(),
                };
                values.retain(|v| range.contains(v));
                values.sort();
                values.dedup();
                Buckets::Text { values }
            }
        };
        Ok(buckets)
    }

    /// `min, min+p, ...` up to and including the first edge past `max`.
    fn period_edges(
        &self,
        min: &DateTime<Utc>,
        max: &DateTime<Utc>,
        period: &Period,
    ) -> Result<Vec<DateTime<Utc>>> {
        let mut edges = Vec::new();
        let mut i = 0u32;
        loop {
            let edge = period.advance(min, i).ok_or_else(|| {
                DomainError::invalid_resolution(format!("period {} overflows the calendar", period))
            })?;
            edges.push(edge);
            if edge > *max {
                return Ok(edges);
            }
            if edges.len() > self.max_buckets {
                return Err(self.too_many_buckets());
            }
            i += 1;
        }
    }

    fn too_many_buckets(&self) -> DomainError {
        DomainError::invalid_resolution(format!(
            "resolution yields more than {} buckets",
            self.max_buckets
        ))
    }
}

fn domain_bounds(
    domain: &DomainResult,
    bounds: Option<&ValueRange<DimensionValue>>,
) -> (Option<DimensionValue>, Option<DimensionValue>) {
    if domain.is_empty() {
        return (None, None);
    }
    match bounds {
        Some(b) => (Some(b.low().clone()), Some(b.high().clone())),
        None => (domain.min_value(), domain.max_value()),
    }
}

fn check_bounds_kind(kind: ValueKind, bounds: Option<&ValueRange<DimensionValue>>) -> Result<()> {
    let Some(bounds) = bounds else {
        return Ok(());
    };
    let compatible = |v: &DimensionValue| {
        v.kind() == kind || (v.kind().is_numeric() && kind.is_numeric())
    };
    if compatible(bounds.low()) && compatible(bounds.high()) {
        Ok(())
    } else {
        Err(DomainError::invalid_range(format!(
            "bounds {} do not match the {} dimension values",
            bounds, kind
        )))
    }
}

fn single_bucket(min: &DimensionValue, max: &DimensionValue, count: u64) -> Histogram {
    Histogram {
        domain: format!("{}--{}", min, max),
        counts: vec![count],
    }
}
