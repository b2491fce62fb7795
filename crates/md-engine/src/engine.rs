//! Request modes of the domain engine.
//!
//! Every mode runs the same pipeline: resolve descriptors, resolve the spatial
//! restriction, build one predicate, extract, then page, bucket or render.
//! Spatial resolution runs first so that an unknown grid set aborts the
//! request before the data source is touched.

use std::collections::BTreeMap;

use md_common::{BoundingBox, GridSetRegistry};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::DomainConfig;
use crate::dimension::{DimensionDescriptor, DimensionPresentation, ResourceInfo};
use crate::error::{DomainError, Result};
use crate::extractor::DomainValueExtractor;
use crate::filter::{DomainFilterBuilder, FilterParser, FilterSpec, Predicate};
use crate::histogram::{Histogram, HistogramBuilder, Resolution};
use crate::pager::{DomainPager, PageRequest, SortOrder};
use crate::range::ValueRange;
use crate::render::{render_contracted, render_domain, render_enumerated, ExpandLimit};
use crate::source::DataSource;
use crate::spatial::{SpatialDomainResolver, SpatialRequest};
use crate::value::DimensionValue;

/// Name selecting the spatial block in a describe request.
const BBOX_DOMAIN: &str = "bbox";

// ============================================================================
// Requests and responses
// ============================================================================

/// List the values of one dimension, a page at a time.
#[derive(Debug, Clone, Default)]
pub struct DomainValuesRequest {
    pub dimension: String,
    pub filters: Vec<FilterSpec>,
    pub spatial: Option<SpatialRequest>,
    pub limit: Option<usize>,
    pub sort: SortOrder,
    /// Last value of the previous page, as a literal of the dimension type.
    pub from_value: Option<String>,
    pub from_end: bool,
}

impl DomainValuesRequest {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainValuesResponse {
    pub identifier: String,
    pub limit: usize,
    pub sort: SortOrder,
    /// Entries in this page.
    pub size: usize,
    /// Entries after the cursor, ignoring the limit.
    pub total: usize,
    pub domain: String,
}

/// Which domains a describe request wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestedDomains {
    #[default]
    All,
    /// Named dimensions, plus `bbox` for the spatial block.
    Only(Vec<String>),
}

impl RequestedDomains {
    /// Parse a comma separated list; an empty string means all domains.
    pub fn parse(s: &str) -> Self {
        let names: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            Self::All
        } else {
            Self::Only(names)
        }
    }

    fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DescribeDomainsRequest {
    pub domains: RequestedDomains,
    pub filters: Vec<FilterSpec>,
    pub spatial: Option<SpatialRequest>,
    pub expand_limit: Option<usize>,
}

/// Extent of the matched records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceDomain {
    pub crs: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionDomain {
    pub identifier: String,
    pub size: usize,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeDomainsResponse {
    pub layer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceDomain>,
    pub dimensions: Vec<DimensionDomain>,
}

impl DescribeDomainsResponse {
    pub fn dimension(&self, identifier: &str) -> Option<&DimensionDomain> {
        self.dimensions
            .iter()
            .find(|d| d.identifier.eq_ignore_ascii_case(identifier))
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistogramRequest {
    pub dimension: String,
    /// Numeric step or ISO-8601 period; defaults per dimension type.
    pub resolution: Option<String>,
    pub filters: Vec<FilterSpec>,
    pub spatial: Option<SpatialRequest>,
    /// `low/high` replacing the bounds derived from the data.
    pub bounds: Option<String>,
}

impl HistogramRequest {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResponse {
    pub identifier: String,
    pub domain: String,
    pub values: Vec<u64>,
}

impl HistogramResponse {
    /// Counts joined by commas.
    pub fn values_string(&self) -> String {
        self.values
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureRequest {
    pub filters: Vec<FilterSpec>,
    pub spatial: Option<SpatialRequest>,
}

/// One matched record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureEntry {
    pub id: String,
    pub footprint: BoundingBox,
    /// Rendered value per enabled dimension, `start/end` for range dimensions.
    pub dimensions: BTreeMap<String, String>,
}

/// Capabilities entry for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub identifier: String,
    pub presentation: DimensionPresentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub domain: String,
}

// ============================================================================
// Engine
// ============================================================================

/// Answers domain, histogram and feature requests for one resource.
pub struct DomainEngine<'a> {
    config: &'a DomainConfig,
    resource: &'a ResourceInfo,
    source: &'a dyn DataSource,
    grid_sets: &'a GridSetRegistry,
}

impl<'a> DomainEngine<'a> {
    pub fn new(
        config: &'a DomainConfig,
        resource: &'a ResourceInfo,
        source: &'a dyn DataSource,
        grid_sets: &'a GridSetRegistry,
    ) -> Self {
        Self {
            config,
            resource,
            source,
            grid_sets,
        }
    }

    pub fn resource(&self) -> &ResourceInfo {
        self.resource
    }

    /// Parser for filter literals against this resource.
    pub fn filter_parser(&self) -> FilterParser<'a> {
        FilterParser::new(self.resource, self.config.max_enumerated_instants)
    }

    /// List the domain of one dimension.
    #[instrument(skip(self, request), fields(layer = %self.resource.name, dimension = %request.dimension))]
    pub fn domain_values(&self, request: &DomainValuesRequest) -> Result<DomainValuesResponse> {
        let descriptor = self.resource.dimension(&request.dimension)?;
        let from_value = request
            .from_value
            .as_deref()
            .map(|raw| descriptor.parse_value(raw))
            .transpose()?;
        let predicate = self.predicate(&request.filters, request.spatial.as_ref())?;

        let domain = DomainValueExtractor::new(self.source).extract(&descriptor, &predicate)?;
        let pager = DomainPager::new(self.config.values_limit_default, self.config.values_limit_max);
        let page = pager.page(
            domain,
            &PageRequest {
                limit: request.limit,
                sort: request.sort,
                from_value,
                from_end: request.from_end,
            },
        );

        debug!(size = page.size(), total = page.total, "domain page");
        Ok(DomainValuesResponse {
            identifier: descriptor.name().to_string(),
            limit: page.limit,
            sort: page.sort,
            size: page.size(),
            total: page.total,
            domain: render_enumerated(&page.entries),
        })
    }

    /// Describe the domains of several dimensions and, optionally, the
    /// spatial extent of the matched records.
    #[instrument(skip(self, request), fields(layer = %self.resource.name))]
    pub fn describe_domains(
        &self,
        request: &DescribeDomainsRequest,
    ) -> Result<DescribeDomainsResponse> {
        let descriptors = self.resource.enabled_dimensions()?;

        if let RequestedDomains::Only(names) = &request.domains {
            let unknown: Vec<String> = names
                .iter()
                .filter(|n| {
                    !n.eq_ignore_ascii_case(BBOX_DOMAIN)
                        && !descriptors.iter().any(|d| d.name().eq_ignore_ascii_case(n))
                })
                .map(|n| format!("'{}'", n))
                .collect();
            if !unknown.is_empty() {
                return Err(DomainError::DimensionNotFound(unknown.join(", ")));
            }
        }

        let predicate = self.predicate(&request.filters, request.spatial.as_ref())?;
        let expand_limit = ExpandLimit::resolve(request.expand_limit, self.resource, self.config);
        let extractor = DomainValueExtractor::new(self.source);

        let space = if request.domains.includes(BBOX_DOMAIN) {
            self.source
                .query_bounds(&predicate)?
                .map(|bbox| SpaceDomain {
                    crs: self.resource.native_crs.to_string(),
                    bbox,
                })
        } else {
            None
        };

        let mut dimensions = Vec::new();
        for descriptor in descriptors
            .iter()
            .filter(|d| request.domains.includes(d.name()))
        {
            let domain = extractor.extract(descriptor, &predicate)?;
            dimensions.push(DimensionDomain {
                identifier: descriptor.name().to_string(),
                size: domain.len(),
                domain: render_domain(&domain, expand_limit),
                default_value: descriptor
                    .default_strategy()
                    .select(&domain)
                    .map(|v| v.to_string()),
            });
        }

        debug!(
            dimensions = dimensions.len(),
            space = space.is_some(),
            "described domains"
        );
        Ok(DescribeDomainsResponse {
            layer: self.resource.name.clone(),
            space,
            dimensions,
        })
    }

    /// Bucket the domain of one dimension.
    #[instrument(skip(self, request), fields(layer = %self.resource.name, dimension = %request.dimension))]
    pub fn histogram(&self, request: &HistogramRequest) -> Result<HistogramResponse> {
        let descriptor = self.resource.dimension(&request.dimension)?;
        let resolution = request
            .resolution
            .as_deref()
            .map(Resolution::parse)
            .transpose()?;
        let bounds = request
            .bounds
            .as_deref()
            .map(|raw| parse_bounds(&descriptor, raw))
            .transpose()?;
        let predicate = self.predicate(&request.filters, request.spatial.as_ref())?;

        let builder = HistogramBuilder::new(
            self.config.histogram_strategy,
            self.config.max_histogram_buckets,
        );
        let Histogram { domain, counts } = builder.compute(
            self.source,
            &descriptor,
            &predicate,
            resolution.as_ref(),
            bounds.as_ref(),
        )?;

        Ok(HistogramResponse {
            identifier: descriptor.name().to_string(),
            domain,
            values: counts,
        })
    }

    /// List matched records with their dimension values and footprints.
    #[instrument(skip(self, request), fields(layer = %self.resource.name))]
    pub fn features(&self, request: &FeatureRequest) -> Result<Vec<FeatureEntry>> {
        let descriptors = self.resource.enabled_dimensions()?;
        let predicate = self.predicate(&request.filters, request.spatial.as_ref())?;
        let records = self.source.query_records(&predicate)?;

        let mut features = Vec::with_capacity(records.len());
        for record in records {
            let mut dimensions = BTreeMap::new();
            for descriptor in &descriptors {
                let rendered = match descriptor.end_attribute() {
                    None => record.attribute(descriptor.attribute()).map(|v| v.to_string()),
                    Some(end) => record
                        .interval(descriptor.attribute(), end)?
                        .map(|r| r.to_string()),
                };
                if let Some(rendered) = rendered {
                    dimensions.insert(descriptor.name().to_string(), rendered);
                }
            }
            features.push(FeatureEntry {
                id: record.id,
                footprint: record.footprint,
                dimensions,
            });
        }

        debug!(features = features.len(), "listed features");
        Ok(features)
    }

    /// Unfiltered summary of every enabled dimension, for capabilities.
    #[instrument(skip(self), fields(layer = %self.resource.name))]
    pub fn dimension_summaries(&self) -> Result<Vec<DimensionSummary>> {
        let extractor = DomainValueExtractor::new(self.source);
        let mut summaries = Vec::new();
        for descriptor in self.resource.enabled_dimensions()? {
            let domain = extractor.extract(&descriptor, &Predicate::Include)?;
            let rendered = match descriptor.presentation() {
                DimensionPresentation::List => render_enumerated(&domain),
                DimensionPresentation::ContinuousInterval => render_contracted(&domain),
            };
            summaries.push(DimensionSummary {
                identifier: descriptor.name().to_string(),
                presentation: descriptor.presentation(),
                default_value: descriptor
                    .default_strategy()
                    .select(&domain)
                    .map(|v| v.to_string()),
                domain: rendered,
            });
        }
        Ok(summaries)
    }

    fn predicate(
        &self,
        filters: &[FilterSpec],
        spatial: Option<&SpatialRequest>,
    ) -> Result<Predicate> {
        let restriction = SpatialDomainResolver::new(self.grid_sets).resolve(self.resource, spatial)?;
        DomainFilterBuilder::new(self.resource)
            .with_filters(filters.iter().cloned())
            .with_spatial(restriction)
            .build()
    }
}

fn parse_bounds(
    descriptor: &DimensionDescriptor,
    raw: &str,
) -> Result<ValueRange<DimensionValue>> {
    let Some((low, high)) = raw.split_once('/') else {
        return Err(DomainError::invalid_parameter(
            "bounds",
            format!("expected 'low/high', got '{}'", raw),
        ));
    };
    ValueRange::new(descriptor.parse_value(low)?, descriptor.parse_value(high)?)
}
