//! Reference layers built from the shared fixtures.

#![allow(dead_code)]

use md_common::{parse_instant, BoundingBox, CrsCode, GridSetRegistry};
use md_engine::dimension::DefaultValueSetting;
use md_engine::{
    DataSource, DimensionConfig, DimensionPresentation, DomainConfig, DomainEngine, FeatureStore,
    FilterSpec, GranuleIndex, Record, ResourceInfo, ResourceKind, ValueKind,
};
use test_utils::{quadrants, watertemp};

pub fn to_bbox((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

fn dimension(name: &str, attribute: &str, end: Option<&str>, kind: ValueKind) -> DimensionConfig {
    DimensionConfig {
        name: name.to_string(),
        attribute: attribute.to_string(),
        end_attribute: end.map(str::to_string),
        enabled: true,
        value_kind: kind,
        default_value: DefaultValueSetting::Minimum,
        presentation: DimensionPresentation::List,
    }
}

// ============================================================================
// Raster: watertemp mosaic
// ============================================================================

pub fn watertemp_resource() -> ResourceInfo {
    let mut time = dimension("time", "ingestion", None, ValueKind::Time);
    time.default_value = DefaultValueSetting::Maximum;
    time.presentation = DimensionPresentation::ContinuousInterval;

    ResourceInfo {
        name: watertemp::LAYER.to_string(),
        kind: ResourceKind::Raster,
        native_crs: CrsCode::Epsg4326,
        native_extent: to_bbox(test_utils::bbox::WATERTEMP),
        dimensions: vec![
            time,
            dimension("elevation", "elevation", None, ValueKind::Integer),
            dimension("custom", "customDimension", None, ValueKind::Text),
        ],
        expand_limit: None,
        expand_limit_max: None,
    }
}

pub fn watertemp_index() -> GranuleIndex {
    let mut index = GranuleIndex::new(watertemp::LAYER);
    for granule in watertemp::GRANULES {
        let time = parse_instant(granule.time).expect("fixture time");
        index.insert(
            Record::new(granule.location, to_bbox(test_utils::bbox::WATERTEMP))
                .with_attribute("elevation", granule.elevation)
                .with_attribute("ingestion", time)
                .with_attribute("customDimension", granule.custom),
        );
    }
    index
}

// ============================================================================
// Vector: world quadrants
// ============================================================================

/// Elevation as a start/end range, or as the start value only.
pub fn quadrants_resource(elevation_range: bool) -> ResourceInfo {
    let elevation = if elevation_range {
        dimension("elevation", "startElevation", Some("endElevation"), ValueKind::Float)
    } else {
        dimension("elevation", "startElevation", None, ValueKind::Float)
    };

    ResourceInfo {
        name: quadrants::LAYER.to_string(),
        kind: ResourceKind::Vector,
        native_crs: CrsCode::Epsg4326,
        native_extent: to_bbox(test_utils::bbox::GLOBAL),
        dimensions: vec![
            dimension("time", "startTime", Some("endTime"), ValueKind::Time),
            elevation,
            // vector layers do not expose custom dimensions
            dimension("custom", "startElevation", None, ValueKind::Float),
        ],
        expand_limit: None,
        expand_limit_max: None,
    }
}

/// Same features, time as the start value only.
pub fn quadrants_point_time_resource() -> ResourceInfo {
    let mut resource = quadrants_resource(true);
    resource.dimensions[0] = dimension("time", "startTime", None, ValueKind::Time);
    resource
}

pub fn quadrants_store() -> FeatureStore {
    let mut store = FeatureStore::new(quadrants::LAYER);
    for feature in quadrants::FEATURES {
        store.insert(
            Record::new("", to_bbox(feature.bbox))
                .with_attribute("startTime", parse_instant(feature.start_time).expect("fixture time"))
                .with_attribute("endTime", parse_instant(feature.end_time).expect("fixture time"))
                .with_attribute("startElevation", feature.start_elevation)
                .with_attribute("endElevation", feature.end_elevation),
        );
    }
    store
}

// ============================================================================
// Harness
// ============================================================================

/// Owns everything an engine borrows.
pub struct Harness {
    pub config: DomainConfig,
    pub resource: ResourceInfo,
    pub source: Box<dyn DataSource>,
    pub grid_sets: GridSetRegistry,
}

impl Harness {
    pub fn new(resource: ResourceInfo, source: impl DataSource + 'static) -> Self {
        Self {
            config: DomainConfig::default(),
            resource,
            source: Box::new(source),
            grid_sets: GridSetRegistry::well_known(),
        }
    }

    pub fn watertemp() -> Self {
        Self::new(watertemp_resource(), watertemp_index())
    }

    pub fn quadrants(elevation_range: bool) -> Self {
        Self::new(quadrants_resource(elevation_range), quadrants_store())
    }

    pub fn with_config(mut self, config: DomainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn engine(&self) -> DomainEngine<'_> {
        DomainEngine::new(&self.config, &self.resource, self.source.as_ref(), &self.grid_sets)
    }

    /// Parse a filter literal the way a request layer would.
    pub fn filter(&self, dimension: &str, raw: &str) -> FilterSpec {
        self.engine()
            .filter_parser()
            .parse(dimension, raw)
            .expect("valid filter")
    }
}
