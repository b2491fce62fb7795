//! The narrow query interface between the engine and a backing store.

use std::collections::{BTreeMap, BTreeSet};

use md_common::BoundingBox;

use crate::error::DataAccessError;
use crate::filter::Predicate;
use crate::range::ValueRange;
use crate::value::DimensionValue;

/// One granule or feature as seen by the engine: an identifier, a footprint
/// and the attribute values dimensions are mapped onto.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub footprint: BoundingBox,
    pub attributes: BTreeMap<String, DimensionValue>,
}

impl Record {
    pub fn new(id: impl Into<String>, footprint: BoundingBox) -> Self {
        Self {
            id: id.into(),
            footprint,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<DimensionValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&DimensionValue> {
        self.attributes.get(name)
    }

    /// The `[start, end]` interval stored in two attributes.
    ///
    /// A missing start takes the end value and vice versa; `Ok(None)` when
    /// both are missing.
    pub fn interval(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Option<ValueRange<DimensionValue>>, DataAccessError> {
        let (low, high) = match (self.attribute(start), self.attribute(end)) {
            (Some(s), Some(e)) => (s.clone(), e.clone()),
            (Some(s), None) => (s.clone(), s.clone()),
            (None, Some(e)) => (e.clone(), e.clone()),
            (None, None) => return Ok(None),
        };
        ValueRange::new(low, high).map(Some).map_err(|e| {
            DataAccessError::QueryFailed(format!("record {}: {}", self.id, e))
        })
    }
}

/// Query capability a raster granule index or a vector feature store offers.
///
/// Only [`query_records`](DataSource::query_records) is required; the other
/// queries have defaults built on it that a store with native support for
/// them (distinct projections, counting, extent aggregation) should override.
/// Calls are synchronous and are never retried by the engine.
pub trait DataSource {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// All records matching the predicate.
    fn query_records(&self, predicate: &Predicate) -> Result<Vec<Record>, DataAccessError>;

    /// Distinct values of `attribute` among matching records, ascending.
    fn query_distinct_values(
        &self,
        predicate: &Predicate,
        attribute: &str,
    ) -> Result<Vec<DimensionValue>, DataAccessError> {
        let values: BTreeSet<DimensionValue> = self
            .query_records(predicate)?
            .into_iter()
            .filter_map(|mut r| r.attributes.remove(attribute))
            .collect();
        Ok(values.into_iter().collect())
    }

    /// Distinct `[start, end]` pairs among matching records, ordered by start
    /// then end.
    fn query_distinct_intervals(
        &self,
        predicate: &Predicate,
        start: &str,
        end: &str,
    ) -> Result<Vec<ValueRange<DimensionValue>>, DataAccessError> {
        let mut intervals = Vec::new();
        for record in self.query_records(predicate)? {
            if let Some(interval) = record.interval(start, end)? {
                intervals.push(interval);
            }
        }
        sort_intervals(&mut intervals);
        intervals.dedup();
        Ok(intervals)
    }

    /// Number of matching records.
    fn count(&self, predicate: &Predicate) -> Result<usize, DataAccessError> {
        Ok(self.query_records(predicate)?.len())
    }

    /// Union of the footprints of matching records.
    fn query_bounds(&self, predicate: &Predicate) -> Result<Option<BoundingBox>, DataAccessError> {
        Ok(self
            .query_records(predicate)?
            .iter()
            .map(|r| r.footprint)
            .reduce(|acc, b| acc.union(&b)))
    }
}

/// Order intervals by low bound, then high bound.
pub fn sort_intervals(intervals: &mut [ValueRange<DimensionValue>]) {
    intervals.sort_by(|a, b| a.low().cmp(b.low()).then_with(|| a.high().cmp(b.high())));
}
