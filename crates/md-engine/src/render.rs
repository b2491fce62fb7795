//! Domain string rendering.
//!
//! A domain renders enumerated (`a,b,c`, intervals as `start/end`) while it
//! has no more entries than the expand limit, and contracted (`min--max`)
//! otherwise or when the limit is zero.

use tracing::info;

use crate::config::DomainConfig;
use crate::dimension::ResourceInfo;
use crate::extractor::DomainResult;
use crate::value::DimensionValue;

/// Resolved threshold between enumerated and contracted rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandLimit(usize);

impl ExpandLimit {
    pub fn new(limit: usize) -> Self {
        Self(limit)
    }

    /// Negotiate the limit for a request. Resource overrides win over the
    /// engine-wide values; client values at or above the maximum are clamped.
    pub fn resolve(client: Option<usize>, resource: &ResourceInfo, config: &DomainConfig) -> Self {
        let max = resource.expand_limit_max.unwrap_or(config.expand_limit_max);
        let default = resource
            .expand_limit
            .unwrap_or(config.expand_limit_default)
            .min(max);

        match client {
            None => Self(default),
            Some(limit) if limit > max => {
                info!(
                    layer = %resource.name,
                    requested = limit,
                    max,
                    "expand limit clamped to maximum"
                );
                Self(max)
            }
            Some(limit) => Self(limit),
        }
    }

    pub fn value(&self) -> usize {
        self.0
    }

    /// Whether a domain of `count` entries renders enumerated.
    pub fn allows(&self, count: usize) -> bool {
        self.0 > 0 && count <= self.0
    }
}

/// Render `domain` enumerated or contracted depending on `limit`.
pub fn render_domain(domain: &DomainResult, limit: ExpandLimit) -> String {
    if limit.allows(domain.len()) {
        render_enumerated(domain)
    } else {
        render_contracted(domain)
    }
}

/// `a,b,c` for values, `s1/e1,s2/e2` for intervals.
pub fn render_enumerated(domain: &DomainResult) -> String {
    let entries: Vec<String> = match domain {
        DomainResult::ValueSet(values) => values.iter().map(DimensionValue::to_string).collect(),
        DomainResult::IntervalSet(intervals) => intervals.iter().map(|r| r.to_string()).collect(),
    };
    entries.join(",")
}

/// `min--max`, or empty for an empty domain.
pub fn render_contracted(domain: &DomainResult) -> String {
    match (domain.min_value(), domain.max_value()) {
        (Some(min), Some(max)) => format!("{}--{}", min, max),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::ResourceKind;
    use crate::range::ValueRange;
    use md_common::{BoundingBox, CrsCode};

    fn resource() -> ResourceInfo {
        ResourceInfo {
            name: "watertemp".to_string(),
            kind: ResourceKind::Raster,
            native_crs: CrsCode::Epsg4326,
            native_extent: BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            dimensions: vec![],
            expand_limit: None,
            expand_limit_max: None,
        }
    }

    #[test]
    fn test_expand_limit_boundary() {
        let domain = DomainResult::ValueSet(vec![1.0.into(), 5.0.into()]);
        assert_eq!(render_domain(&domain, ExpandLimit::new(0)), "1.0--5.0");
        assert_eq!(render_domain(&domain, ExpandLimit::new(1)), "1.0--5.0");
        assert_eq!(render_domain(&domain, ExpandLimit::new(2)), "1.0,5.0");
        assert_eq!(render_domain(&domain, ExpandLimit::new(usize::MAX)), "1.0,5.0");
    }

    #[test]
    fn test_intervals() {
        let domain = DomainResult::IntervalSet(vec![
            ValueRange::new(1.0.into(), 2.0.into()).unwrap(),
            ValueRange::new(5.0.into(), 7.0.into()).unwrap(),
            ValueRange::new(3.0.into(), 4.0.into()).unwrap(),
        ]);
        assert_eq!(render_enumerated(&domain), "1.0/2.0,5.0/7.0,3.0/4.0");
        // the contracted maximum comes from the end values
        assert_eq!(render_contracted(&domain), "1.0--7.0");
    }

    #[test]
    fn test_empty_domain_renders_empty() {
        let domain = DomainResult::ValueSet(vec![]);
        assert_eq!(render_domain(&domain, ExpandLimit::new(0)), "");
        assert_eq!(render_domain(&domain, ExpandLimit::new(10)), "");
    }

    #[test]
    fn test_resolve_limits() {
        let config = DomainConfig {
            expand_limit_default: 10,
            expand_limit_max: 100,
            ..Default::default()
        };
        assert_eq!(ExpandLimit::resolve(None, &resource(), &config).value(), 10);
        assert_eq!(ExpandLimit::resolve(Some(3), &resource(), &config).value(), 3);
        assert_eq!(ExpandLimit::resolve(Some(500), &resource(), &config).value(), 100);

        let overridden = ResourceInfo {
            expand_limit: Some(0),
            expand_limit_max: Some(50),
            ..resource()
        };
        assert_eq!(ExpandLimit::resolve(None, &overridden, &config).value(), 0);
        assert_eq!(ExpandLimit::resolve(Some(80), &overridden, &config).value(), 50);
    }
}
