//! Filter constraints and the predicates they compile into.

use md_common::BoundingBox;
use tracing::debug;

use crate::dimension::{DimensionDescriptor, ResourceInfo};
use crate::error::{DomainError, Result};
use crate::range::ValueRange;
use crate::source::Record;
use crate::spatial::SpatialRestriction;
use crate::value::{DimensionValue, ValueKind};

/// What a filter requires of a dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equality(DimensionValue),
    Interval(ValueRange<DimensionValue>),
    ListOfValues(Vec<DimensionValue>),
}

/// A constraint on one named dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub dimension: String,
    pub constraint: Constraint,
}

impl FilterSpec {
    pub fn new(dimension: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            dimension: dimension.into(),
            constraint,
        }
    }

    pub fn equality(dimension: impl Into<String>, value: impl Into<DimensionValue>) -> Self {
        Self::new(dimension, Constraint::Equality(value.into()))
    }

    pub fn interval(dimension: impl Into<String>, range: ValueRange<DimensionValue>) -> Self {
        Self::new(dimension, Constraint::Interval(range))
    }

    pub fn list(dimension: impl Into<String>, values: Vec<DimensionValue>) -> Self {
        Self::new(dimension, Constraint::ListOfValues(values))
    }
}

/// Comparison operator of an attribute predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

/// A record predicate handed to the data-access collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Include,
    Exclude,
    Equals {
        attribute: String,
        value: DimensionValue,
    },
    In {
        attribute: String,
        values: Vec<DimensionValue>,
    },
    Compare {
        attribute: String,
        op: Comparison,
        value: DimensionValue,
    },
    /// Footprint overlaps the box; shared edges count as overlap.
    Intersects(BoundingBox),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(attribute: &str, op: Comparison, value: DimensionValue) -> Self {
        Predicate::Compare {
            attribute: attribute.to_string(),
            op,
            value,
        }
    }

    /// Conjunction with `Include` dropped and nested conjunctions flattened.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut parts = Vec::new();
        for predicate in predicates {
            match predicate {
                Predicate::Include => {}
                Predicate::Exclude => return Predicate::Exclude,
                Predicate::And(nested) => parts.extend(nested),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Include,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Disjunction with `Exclude` dropped and nested disjunctions flattened.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut parts = Vec::new();
        for predicate in predicates {
            match predicate {
                Predicate::Exclude => {}
                Predicate::Include => return Predicate::Include,
                Predicate::Or(nested) => parts.extend(nested),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Exclude,
            1 => parts.remove(0),
            _ => Predicate::Or(parts),
        }
    }

    /// Evaluate against a record. A missing attribute never matches.
    pub fn evaluate(&self, record: &Record) -> bool {
        match self {
            Predicate::Include => true,
            Predicate::Exclude => false,
            Predicate::Equals { attribute, value } => {
                record.attribute(attribute).is_some_and(|v| v == value)
            }
            Predicate::In { attribute, values } => record
                .attribute(attribute)
                .is_some_and(|v| values.contains(v)),
            Predicate::Compare {
                attribute,
                op,
                value,
            } => record.attribute(attribute).is_some_and(|v| match op {
                Comparison::Lt => v < value,
                Comparison::Le => v <= value,
                Comparison::Gt => v > value,
                Comparison::Ge => v >= value,
            }),
            Predicate::Intersects(bbox) => {
                let fp = &record.footprint;
                fp.min_x <= bbox.max_x
                    && fp.max_x >= bbox.min_x
                    && fp.min_y <= bbox.max_y
                    && fp.max_y >= bbox.min_y
            }
            Predicate::And(parts) => parts.iter().all(|p| p.evaluate(record)),
            Predicate::Or(parts) => parts.iter().any(|p| p.evaluate(record)),
        }
    }
}

/// Compiles filters and a spatial restriction into one [`Predicate`].
///
/// Point dimensions compile to equality / membership / bound comparisons on
/// their attribute. Range dimensions compile to interval overlap,
/// `start <= high AND end >= low`, so a single instant matches every record
/// whose interval contains it.
pub struct DomainFilterBuilder<'a> {
    resource: &'a ResourceInfo,
    filters: Vec<FilterSpec>,
    spatial: SpatialRestriction,
}

impl<'a> DomainFilterBuilder<'a> {
    pub fn new(resource: &'a ResourceInfo) -> Self {
        Self {
            resource,
            filters: Vec::new(),
            spatial: SpatialRestriction::Unrestricted,
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterSpec>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn with_spatial(mut self, restriction: SpatialRestriction) -> Self {
        self.spatial = restriction;
        self
    }

    /// Build the conjunction of every filter and the spatial restriction.
    pub fn build(&self) -> Result<Predicate> {
        let mut parts = Vec::with_capacity(self.filters.len() + 1);
        for filter in &self.filters {
            let descriptor = self.resource.filter_dimension(&filter.dimension)?;
            parts.push(constraint_predicate(&descriptor, &filter.constraint));
        }
        parts.push(self.spatial.to_predicate());
        Ok(Predicate::and(parts))
    }
}

/// Predicate selecting records that satisfy `constraint` on `descriptor`.
pub fn constraint_predicate(descriptor: &DimensionDescriptor, constraint: &Constraint) -> Predicate {
    let start = descriptor.attribute();
    match (descriptor.end_attribute(), constraint) {
        (None, Constraint::Equality(value)) => Predicate::Equals {
            attribute: start.to_string(),
            value: value.clone(),
        },
        (None, Constraint::ListOfValues(values)) => Predicate::In {
            attribute: start.to_string(),
            values: values.clone(),
        },
        (None, Constraint::Interval(range)) => Predicate::and([
            Predicate::compare(start, lower_op(range), range.low().clone()),
            Predicate::compare(start, upper_op(range), range.high().clone()),
        ]),
        (Some(end), Constraint::Equality(value)) => overlap(start, end, &ValueRange::point(value.clone())),
        (Some(end), Constraint::Interval(range)) => overlap(start, end, range),
        (Some(end), Constraint::ListOfValues(values)) => Predicate::or(
            values
                .iter()
                .map(|v| overlap(start, end, &ValueRange::point(v.clone()))),
        ),
    }
}

/// `start <= high AND end >= low`, tightened for open bounds.
fn overlap(start: &str, end: &str, range: &ValueRange<DimensionValue>) -> Predicate {
    Predicate::and([
        Predicate::compare(start, upper_op(range), range.high().clone()),
        Predicate::compare(end, lower_op(range), range.low().clone()),
    ])
}

fn lower_op(range: &ValueRange<DimensionValue>) -> Comparison {
    if range.is_low_inclusive() {
        Comparison::Ge
    } else {
        Comparison::Gt
    }
}

fn upper_op(range: &ValueRange<DimensionValue>) -> Comparison {
    if range.is_high_inclusive() {
        Comparison::Le
    } else {
        Comparison::Lt
    }
}

/// Turns raw request literals into typed [`FilterSpec`]s.
///
/// Accepted syntax:
/// - `v` equality
/// - `a,b,c` list of values
/// - `low/high` closed interval
/// - `start/end/step` enumerated list, where step is an ISO-8601 period for
///   temporal dimensions or a number for numeric ones
///
/// A `start/end/step` expansion producing more than `max_enumerated`
/// values degrades to the closed interval `[start, end]`.
pub struct FilterParser<'a> {
    resource: &'a ResourceInfo,
    max_enumerated: usize,
}

impl<'a> FilterParser<'a> {
    pub fn new(resource: &'a ResourceInfo, max_enumerated: usize) -> Self {
        Self {
            resource,
            max_enumerated,
        }
    }

    pub fn parse(&self, dimension: &str, raw: &str) -> Result<FilterSpec> {
        let descriptor = self.resource.filter_dimension(dimension)?;
        let constraint = self.parse_constraint(&descriptor, raw)?;
        Ok(FilterSpec::new(descriptor.name(), constraint))
    }

    pub fn parse_constraint(&self, descriptor: &DimensionDescriptor, raw: &str) -> Result<Constraint> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::invalid_parameter(
                descriptor.name(),
                "empty filter value",
            ));
        }

        if raw.contains(',') {
            if raw.contains('/') {
                return Err(DomainError::invalid_parameter(
                    descriptor.name(),
                    format!("lists of ranges are not supported: {}", raw),
                ));
            }
            let values = raw
                .split(',')
                .map(|item| descriptor.parse_value(item))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Constraint::ListOfValues(values));
        }

        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            [single] => Ok(Constraint::Equality(descriptor.parse_value(single)?)),
            [low, high] => {
                let range = ValueRange::new(descriptor.parse_value(low)?, descriptor.parse_value(high)?)?;
                Ok(Constraint::Interval(range))
            }
            [start, end, step] => {
                let range = ValueRange::new(descriptor.parse_value(start)?, descriptor.parse_value(end)?)?;
                self.expand(descriptor, range, step)
            }
            _ => Err(DomainError::invalid_parameter(
                descriptor.name(),
                format!("cannot interpret '{}'", raw),
            )),
        }
    }

    fn expand(
        &self,
        descriptor: &DimensionDescriptor,
        range: ValueRange<DimensionValue>,
        step: &str,
    ) -> Result<Constraint> {
        let values = match descriptor.value_kind() {
            ValueKind::Time => self.expand_period(descriptor, &range, step)?,
            kind if kind.is_numeric() => self.expand_numeric(descriptor, &range, step)?,
            _ => {
                return Err(DomainError::invalid_parameter(
                    descriptor.name(),
                    "start/end/step syntax needs a numeric or temporal dimension",
                ))
            }
        };

        match values {
            Some(values) => Ok(Constraint::ListOfValues(values)),
            None => {
                debug!(
                    dimension = descriptor.name(),
                    max = self.max_enumerated,
                    "start/end/step expansion too large, using interval"
                );
                Ok(Constraint::Interval(range))
            }
        }
    }

    /// `None` once the expansion exceeds the configured maximum.
    fn expand_period(
        &self,
        descriptor: &DimensionDescriptor,
        range: &ValueRange<DimensionValue>,
        step: &str,
    ) -> Result<Option<Vec<DimensionValue>>> {
        let period = md_common::Period::parse(step)
            .map_err(|e| DomainError::invalid_parameter(descriptor.name(), e.to_string()))?;
        let (Some(start), Some(end)) = (range.low().as_time(), range.high().as_time()) else {
            return Err(DomainError::invalid_parameter(descriptor.name(), "expected instants"));
        };

        let mut values = Vec::new();
        let mut i = 0u32;
        while let Some(instant) = period.advance(start, i) {
            if instant > *end {
                break;
            }
            if values.len() == self.max_enumerated {
                return Ok(None);
            }
            values.push(DimensionValue::Time(instant));
            i += 1;
        }
        Ok(Some(values))
    }

    fn expand_numeric(
        &self,
        descriptor: &DimensionDescriptor,
        range: &ValueRange<DimensionValue>,
        step: &str,
    ) -> Result<Option<Vec<DimensionValue>>> {
        let step: f64 = step
            .trim()
            .parse()
            .ok()
            .filter(|s: &f64| s.is_finite() && *s > 0.0)
            .ok_or_else(|| {
                DomainError::invalid_parameter(descriptor.name(), format!("invalid step '{}'", step))
            })?;
        let (Some(low), Some(high)) = (range.low().as_f64(), range.high().as_f64()) else {
            return Err(DomainError::invalid_parameter(descriptor.name(), "expected numbers"));
        };

        let count = ((high - low) / step).floor() + 1.0;
        if !count.is_finite() || count > self.max_enumerated as f64 {
            return Ok(None);
        }
        let count = count as usize;
        let values = (0..count)
            .map(|i| low + i as f64 * step)
            .map(|v| match descriptor.value_kind() {
                ValueKind::Integer => DimensionValue::Integer(v.round() as i64),
                _ => DimensionValue::Float(v),
            })
            .collect();
        Ok(Some(values))
    }
}
