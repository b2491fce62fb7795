//! Domain extraction from a data source.

use tracing::debug;

use crate::dimension::{DimensionDescriptor, DimensionKind};
use crate::error::Result;
use crate::filter::Predicate;
use crate::range::ValueRange;
use crate::source::{sort_intervals, DataSource};
use crate::value::DimensionValue;

/// The values or intervals a dimension takes across a filtered dataset.
///
/// Entries are ordered by low bound, ties broken by high bound.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainResult {
    /// Values of a point dimension.
    ValueSet(Vec<DimensionValue>),
    /// Intervals of a range dimension.
    IntervalSet(Vec<ValueRange<DimensionValue>>),
}

impl DomainResult {
    /// An empty result shaped for `kind`.
    pub fn empty(kind: DimensionKind) -> Self {
        match kind {
            DimensionKind::Point => DomainResult::ValueSet(Vec::new()),
            DimensionKind::Range => DomainResult::IntervalSet(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DomainResult::ValueSet(values) => values.len(),
            DomainResult::IntervalSet(intervals) => intervals.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest low bound.
    pub fn min_value(&self) -> Option<DimensionValue> {
        match self {
            DomainResult::ValueSet(values) => values.iter().min().cloned(),
            DomainResult::IntervalSet(intervals) => {
                intervals.iter().map(|r| r.low()).min().cloned()
            }
        }
    }

    /// Largest high bound; for intervals this comes from the end values.
    pub fn max_value(&self) -> Option<DimensionValue> {
        match self {
            DomainResult::ValueSet(values) => values.iter().max().cloned(),
            DomainResult::IntervalSet(intervals) => {
                intervals.iter().map(|r| r.high()).max().cloned()
            }
        }
    }
}

/// Pulls domains out of a [`DataSource`], branching once on the dimension kind.
pub struct DomainValueExtractor<'a> {
    source: &'a dyn DataSource,
}

impl<'a> DomainValueExtractor<'a> {
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self { source }
    }

    /// Distinct sorted values (point) or intervals (range) matching the predicate.
    pub fn extract(&self, descriptor: &DimensionDescriptor, predicate: &Predicate) -> Result<DomainResult> {
        let result = match descriptor.end_attribute() {
            None => DomainResult::ValueSet(
                self.source
                    .query_distinct_values(predicate, descriptor.attribute())?,
            ),
            Some(end) => DomainResult::IntervalSet(self.source.query_distinct_intervals(
                predicate,
                descriptor.attribute(),
                end,
            )?),
        };

        debug!(
            source = self.source.name(),
            dimension = descriptor.name(),
            entries = result.len(),
            "extracted domain"
        );
        Ok(result)
    }

    /// One entry per matching record, sorted, duplicates kept. Histograms
    /// count records rather than distinct values.
    pub fn extract_samples(
        &self,
        descriptor: &DimensionDescriptor,
        predicate: &Predicate,
    ) -> Result<DomainResult> {
        let records = self.source.query_records(predicate)?;

        let result = match descriptor.end_attribute() {
            None => {
                let mut values: Vec<DimensionValue> = records
                    .iter()
                    .filter_map(|r| r.attribute(descriptor.attribute()).cloned())
                    .collect();
                values.sort();
                DomainResult::ValueSet(values)
            }
            Some(end) => {
                let mut intervals = Vec::with_capacity(records.len());
                for record in &records {
                    if let Some(interval) = record.interval(descriptor.attribute(), end)? {
                        intervals.push(interval);
                    }
                }
                sort_intervals(&mut intervals);
                DomainResult::IntervalSet(intervals)
            }
        };

        debug!(
            source = self.source.name(),
            dimension = descriptor.name(),
            records = records.len(),
            samples = result.len(),
            "extracted samples"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FeatureStore;
    use crate::source::Record;
    use crate::value::ValueKind;
    use md_common::BoundingBox;

    fn store() -> FeatureStore {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut store = FeatureStore::new("elevations");
        for (start, end) in [(1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (5.0, 7.0), (2.0, 3.0)] {
            store.insert(
                Record::new("", bbox)
                    .with_attribute("startElevation", start)
                    .with_attribute("endElevation", end),
            );
        }
        store
    }

    #[test]
    fn test_point_extraction_is_distinct_and_sorted() {
        let store = store();
        let descriptor = DimensionDescriptor::point("elevation", "endElevation", ValueKind::Float);
        let result = DomainValueExtractor::new(&store)
            .extract(&descriptor, &Predicate::Include)
            .unwrap();
        assert_eq!(
            result,
            DomainResult::ValueSet(vec![2.0.into(), 3.0.into(), 4.0.into(), 7.0.into()])
        );
    }

    #[test]
    fn test_range_extraction_is_distinct_and_sorted() {
        let store = store();
        let descriptor = DimensionDescriptor::range(
            "elevation",
            "startElevation",
            "endElevation",
            ValueKind::Float,
        );
        let result = DomainValueExtractor::new(&store)
            .extract(&descriptor, &Predicate::Include)
            .unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result.min_value(), Some(1.0.into()));
        assert_eq!(result.max_value(), Some(7.0.into()));
    }

    #[test]
    fn test_samples_keep_duplicates() {
        let store = store();
        let descriptor = DimensionDescriptor::range(
            "elevation",
            "startElevation",
            "endElevation",
            ValueKind::Float,
        );
        let samples = DomainValueExtractor::new(&store)
            .extract_samples(&descriptor, &Predicate::Include)
            .unwrap();
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_no_match_yields_empty_set() {
        let store = store();
        let descriptor = DimensionDescriptor::point("elevation", "endElevation", ValueKind::Float);
        let result = DomainValueExtractor::new(&store)
            .extract(&descriptor, &Predicate::Exclude)
            .unwrap();
        assert_eq!(result, DomainResult::empty(crate::DimensionKind::Point));
        assert!(result.is_empty());
    }
}
