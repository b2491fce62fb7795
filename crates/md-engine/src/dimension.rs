//! Resource metadata and dimension descriptors.
//!
//! [`ResourceInfo`] is the read-only snapshot of a layer's configuration the
//! catalog hands to the engine. Descriptors are derived from it per request and
//! decide, for the rest of the pipeline, whether a dimension deals in single
//! values or in intervals.

use md_common::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::extractor::DomainResult;
use crate::value::{DimensionValue, ValueKind};

pub const TIME: &str = "time";
pub const ELEVATION: &str = "elevation";

/// Backing store type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Tiled mosaic addressed by per-granule attributes.
    Raster,
    /// Feature store addressed by attribute predicates.
    Vector,
}

/// Layer metadata snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub name: String,
    pub kind: ResourceKind,
    pub native_crs: CrsCode,
    pub native_extent: BoundingBox,
    #[serde(default)]
    pub dimensions: Vec<DimensionConfig>,
    /// Overrides the engine-wide default expand limit.
    #[serde(default)]
    pub expand_limit: Option<usize>,
    /// Overrides the engine-wide maximum expand limit.
    #[serde(default)]
    pub expand_limit_max: Option<usize>,
}

/// Configuration of one dimension on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionConfig {
    pub name: String,
    /// Attribute holding the value, or the start of the interval.
    pub attribute: String,
    /// Attribute holding the end of the interval.
    #[serde(default)]
    pub end_attribute: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub value_kind: ValueKind,
    #[serde(default)]
    pub default_value: DefaultValueSetting,
    #[serde(default)]
    pub presentation: DimensionPresentation,
}

fn default_enabled() -> bool {
    true
}

/// Default value selection as written in layer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "lowercase")]
pub enum DefaultValueSetting {
    #[default]
    Minimum,
    Maximum,
    Nearest(String),
    Fixed(String),
}

/// How a dimension's domain is advertised in capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionPresentation {
    /// Enumerate every value.
    #[default]
    List,
    /// Advertise only `min--max`.
    ContinuousInterval,
}

/// Whether a dimension is backed by one attribute or a start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Point,
    Range,
}

/// Typed default value selection.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValueStrategy {
    Minimum,
    Maximum,
    /// The domain entry closest to the target.
    Nearest(DimensionValue),
    Fixed(DimensionValue),
}

impl DefaultValueStrategy {
    /// Pick the default out of a (possibly filtered) domain.
    ///
    /// Only `Fixed` yields a value for an empty domain. `Nearest` prefers the
    /// lower candidate on ties and returns the target itself when an interval
    /// contains it.
    pub fn select(&self, domain: &DomainResult) -> Option<DimensionValue> {
        match self {
            DefaultValueStrategy::Fixed(value) => Some(value.clone()),
            DefaultValueStrategy::Minimum => domain.min_value(),
            DefaultValueStrategy::Maximum => domain.max_value(),
            DefaultValueStrategy::Nearest(target) => match domain {
                DomainResult::ValueSet(values) => nearest(target, values.iter()),
                DomainResult::IntervalSet(intervals) => {
                    if intervals.iter().any(|r| r.contains(target)) {
                        return Some(target.clone());
                    }
                    nearest(target, intervals.iter().flat_map(|r| [r.low(), r.high()]))
                }
            },
        }
    }
}

fn nearest<'a>(
    target: &DimensionValue,
    candidates: impl Iterator<Item = &'a DimensionValue>,
) -> Option<DimensionValue> {
    let mut best: Option<(&DimensionValue, f64)> = None;
    for candidate in candidates {
        let distance = match candidate.distance(target) {
            Some(d) => d,
            None if candidate == target => 0.0,
            None => continue,
        };
        best = match best {
            Some((b, d)) if d < distance || (d == distance && b <= candidate) => Some((b, d)),
            _ => Some((candidate, distance)),
        };
    }
    best.map(|(value, _)| value.clone())
}

/// A resolved dimension, valid for the lifetime of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionDescriptor {
    name: String,
    attribute: String,
    end_attribute: Option<String>,
    value_kind: ValueKind,
    default_strategy: DefaultValueStrategy,
    presentation: DimensionPresentation,
}

impl DimensionDescriptor {
    /// A dimension backed by a single attribute.
    pub fn point(name: impl Into<String>, attribute: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            end_attribute: None,
            value_kind,
            default_strategy: DefaultValueStrategy::Minimum,
            presentation: DimensionPresentation::List,
        }
    }

    /// A dimension backed by a start and an end attribute.
    pub fn range(
        name: impl Into<String>,
        start_attribute: impl Into<String>,
        end_attribute: impl Into<String>,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            name: name.into(),
            attribute: start_attribute.into(),
            end_attribute: Some(end_attribute.into()),
            value_kind,
            default_strategy: DefaultValueStrategy::Minimum,
            presentation: DimensionPresentation::List,
        }
    }

    pub fn with_default_strategy(mut self, strategy: DefaultValueStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_presentation(mut self, presentation: DimensionPresentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        if self.end_attribute.is_some() {
            DimensionKind::Range
        } else {
            DimensionKind::Point
        }
    }

    /// The value attribute, or the start attribute of a range dimension.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn end_attribute(&self) -> Option<&str> {
        self.end_attribute.as_deref()
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn default_strategy(&self) -> &DefaultValueStrategy {
        &self.default_strategy
    }

    pub fn presentation(&self) -> DimensionPresentation {
        self.presentation
    }

    /// Parse a literal as a value of this dimension.
    pub fn parse_value(&self, raw: &str) -> Result<DimensionValue> {
        self.value_kind
            .parse(raw)
            .map_err(|e| DomainError::invalid_parameter(&self.name, e.to_string()))
    }
}

impl DimensionConfig {
    /// Build the descriptor for this configuration.
    pub fn to_descriptor(&self) -> Result<DimensionDescriptor> {
        let descriptor = match &self.end_attribute {
            Some(end) => {
                DimensionDescriptor::range(&self.name, &self.attribute, end, self.value_kind)
            }
            None => DimensionDescriptor::point(&self.name, &self.attribute, self.value_kind),
        };

        let strategy = match &self.default_value {
            DefaultValueSetting::Minimum => DefaultValueStrategy::Minimum,
            DefaultValueSetting::Maximum => DefaultValueStrategy::Maximum,
            DefaultValueSetting::Nearest(raw) => {
                DefaultValueStrategy::Nearest(descriptor.parse_value(raw)?)
            }
            DefaultValueSetting::Fixed(raw) => {
                DefaultValueStrategy::Fixed(descriptor.parse_value(raw)?)
            }
        };

        Ok(descriptor
            .with_default_strategy(strategy)
            .with_presentation(self.presentation))
    }
}

impl ResourceInfo {
    /// Dimensions this resource exposes. Vector resources only carry time and
    /// elevation; raster resources also expose custom dimensions.
    pub fn exposed_dimensions(&self) -> impl Iterator<Item = &DimensionConfig> {
        let kind = self.kind;
        self.dimensions.iter().filter(move |d| match kind {
            ResourceKind::Raster => true,
            ResourceKind::Vector => {
                d.name.eq_ignore_ascii_case(TIME) || d.name.eq_ignore_ascii_case(ELEVATION)
            }
        })
    }

    fn find(&self, name: &str) -> Option<&DimensionConfig> {
        self.exposed_dimensions()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Resolve the queried dimension.
    pub fn dimension(&self, name: &str) -> Result<DimensionDescriptor> {
        match self.find(name) {
            Some(config) if config.enabled => config.to_descriptor(),
            _ => Err(DomainError::DimensionNotFound(name.to_string())),
        }
    }

    /// Resolve a filter dimension: a name that is not configured at all is
    /// unknown, a configured but disabled one is not found.
    pub fn filter_dimension(&self, name: &str) -> Result<DimensionDescriptor> {
        match self.find(name) {
            Some(config) if config.enabled => config.to_descriptor(),
            Some(_) => Err(DomainError::DimensionNotFound(name.to_string())),
            None => Err(DomainError::UnknownDimension(name.to_string())),
        }
    }

    /// Every enabled dimension, in configuration order.
    pub fn enabled_dimensions(&self) -> Result<Vec<DimensionDescriptor>> {
        self.exposed_dimensions()
            .filter(|d| d.enabled)
            .map(DimensionConfig::to_descriptor)
            .collect()
    }
}
