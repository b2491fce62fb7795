//! In-memory data sources.
//!
//! [`GranuleIndex`] stands in for the attribute catalog of a raster mosaic and
//! [`FeatureStore`] for a vector feature store. Both evaluate predicates
//! directly against their records.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md_common::BoundingBox;

use crate::error::DataAccessError;
use crate::filter::Predicate;
use crate::range::ValueRange;
use crate::source::{sort_intervals, DataSource, Record};
use crate::value::DimensionValue;

/// Shared flag the request layer sets to abort running queries.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), DataAccessError> {
        if self.is_cancelled() {
            Err(DataAccessError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-granule attribute rows of a raster mosaic.
///
/// Each granule is one file of the mosaic; its record id is the granule
/// location and its footprint the granule extent.
#[derive(Debug, Clone)]
pub struct GranuleIndex {
    name: String,
    granules: Vec<Record>,
    cancellation: CancellationFlag,
}

impl GranuleIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granules: Vec::new(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Register a granule; a granule already indexed at the same location is replaced.
    pub fn insert(&mut self, granule: Record) {
        self.granules.retain(|g| g.id != granule.id);
        self.granules.push(granule);
    }

    pub fn len(&self) -> usize {
        self.granules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granules.is_empty()
    }

    fn matching<'a>(
        &'a self,
        predicate: &'a Predicate,
    ) -> Result<impl Iterator<Item = &'a Record> + 'a, DataAccessError> {
        self.cancellation.check()?;
        Ok(self.granules.iter().filter(move |g| predicate.evaluate(g)))
    }
}

impl DataSource for GranuleIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn query_records(&self, predicate: &Predicate) -> Result<Vec<Record>, DataAccessError> {
        Ok(self.matching(predicate)?.cloned().collect())
    }

    fn query_distinct_values(
        &self,
        predicate: &Predicate,
        attribute: &str,
    ) -> Result<Vec<DimensionValue>, DataAccessError> {
        let values: BTreeSet<&DimensionValue> = self
            .matching(predicate)?
            .filter_map(|g| g.attribute(attribute))
            .collect();
        Ok(values.into_iter().cloned().collect())
    }

    fn query_distinct_intervals(
        &self,
        predicate: &Predicate,
        start: &str,
        end: &str,
    ) -> Result<Vec<ValueRange<DimensionValue>>, DataAccessError> {
        let mut intervals = Vec::new();
        for granule in self.matching(predicate)? {
            if let Some(interval) = granule.interval(start, end)? {
                intervals.push(interval);
            }
        }
        sort_intervals(&mut intervals);
        intervals.dedup();
        Ok(intervals)
    }

    fn count(&self, predicate: &Predicate) -> Result<usize, DataAccessError> {
        Ok(self.matching(predicate)?.count())
    }

    fn query_bounds(&self, predicate: &Predicate) -> Result<Option<BoundingBox>, DataAccessError> {
        Ok(self
            .matching(predicate)?
            .map(|g| g.footprint)
            .reduce(|acc, b| acc.union(&b)))
    }
}

/// Features of one vector feature type.
///
/// Features inserted without an id get `<type name>.<n>`.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    type_name: String,
    features: Vec<Record>,
    cancellation: CancellationFlag,
}

impl FeatureStore {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            features: Vec::new(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn insert(&mut self, mut feature: Record) {
        if feature.id.is_empty() {
            feature.id = format!("{}.{}", self.type_name, self.features.len());
        }
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl DataSource for FeatureStore {
    fn name(&self) -> &str {
        &self.type_name
    }

    fn query_records(&self, predicate: &Predicate) -> Result<Vec<Record>, DataAccessError> {
        self.cancellation.check()?;
        Ok(self
            .features
            .iter()
            .filter(|f| predicate.evaluate(f))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granule(location: &str, elevation: i64) -> Record {
        Record::new(location, BoundingBox::new(0.0, 40.0, 14.0, 44.0))
            .with_attribute("elevation", elevation)
    }

    #[test]
    fn test_granule_reinsert_replaces() {
        let mut index = GranuleIndex::new("watertemp");
        index.insert(granule("a.tiff", 0));
        index.insert(granule("a.tiff", 100));
        assert_eq!(index.len(), 1);
        assert_eq!(
            index
                .query_distinct_values(&Predicate::Include, "elevation")
                .unwrap(),
            vec![DimensionValue::Integer(100)]
        );
    }

    #[test]
    fn test_granule_bounds_union() {
        let mut index = GranuleIndex::new("watertemp");
        index.insert(granule("a.tiff", 0));
        index.insert(
            Record::new("b.tiff", BoundingBox::new(-1.0, 39.0, 1.0, 41.0)).with_attribute("elevation", 0),
        );
        assert_eq!(
            index.query_bounds(&Predicate::Include).unwrap(),
            Some(BoundingBox::new(-1.0, 39.0, 14.0, 44.0))
        );
        assert_eq!(index.query_bounds(&Predicate::Exclude).unwrap(), None);
        assert_eq!(index.count(&Predicate::Include).unwrap(), 2);
    }

    #[test]
    fn test_feature_ids_are_assigned() {
        let mut store = FeatureStore::new("ElevationWithStartEnd");
        store.insert(Record::new("", BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        store.insert(Record::new("custom", BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        let ids: Vec<String> = store
            .query_records(&Predicate::Include)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["ElevationWithStartEnd.0", "custom"]);
    }

    #[test]
    fn test_cancelled_queries_fail() {
        let flag = CancellationFlag::new();
        let mut index = GranuleIndex::new("watertemp").with_cancellation(flag.clone());
        index.insert(granule("a.tiff", 0));
        let store = FeatureStore::new("features").with_cancellation(flag.clone());

        flag.cancel();
        assert!(matches!(
            index.count(&Predicate::Include),
            Err(DataAccessError::Cancelled)
        ));
        assert!(matches!(
            store.query_records(&Predicate::Include),
            Err(DataAccessError::Cancelled)
        ));
    }
}
