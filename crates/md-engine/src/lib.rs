//! Multidimensional domain engine.
//!
//! Answers "which values, intervals and histograms exist along a dimension of a
//! layer" for raster granule indexes and vector feature stores alike. Requests
//! flow through the same stages every time:
//!
//! 1. resolve the [`DimensionDescriptor`] of the queried and filtered dimensions
//! 2. resolve the spatial restriction ([`SpatialDomainResolver`])
//! 3. build one predicate ([`DomainFilterBuilder`])
//! 4. extract the domain from a [`DataSource`] ([`DomainValueExtractor`])
//! 5. page it ([`DomainPager`]), bucket it ([`HistogramBuilder`]) or render it
//!
//! [`DomainEngine`] wires the stages together for the four request modes.

pub mod config;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod histogram;
pub mod memory;
pub mod pager;
pub mod range;
pub mod render;
pub mod source;
pub mod spatial;
pub mod value;

pub use config::DomainConfig;
pub use dimension::{
    DefaultValueStrategy, DimensionConfig, DimensionDescriptor, DimensionKind,
    DimensionPresentation, ResourceInfo, ResourceKind,
};
pub use engine::{
    DescribeDomainsRequest, DescribeDomainsResponse, DimensionDomain, DimensionSummary,
    DomainEngine, DomainValuesRequest, DomainValuesResponse, FeatureEntry, FeatureRequest,
    HistogramRequest, HistogramResponse, RequestedDomains, SpaceDomain,
};
pub use error::{DataAccessError, DomainError, Result};
pub use extractor::{DomainResult, DomainValueExtractor};
pub use filter::{Constraint, DomainFilterBuilder, FilterParser, FilterSpec, Predicate};
pub use histogram::{Histogram, HistogramBuilder, HistogramStrategy, Resolution};
pub use memory::{CancellationFlag, FeatureStore, GranuleIndex};
pub use pager::{DomainPager, Page, PageRequest, SortOrder};
pub use range::ValueRange;
pub use render::ExpandLimit;
pub use source::{DataSource, Record};
pub use spatial::{SpatialDomainResolver, SpatialRequest, SpatialRestriction};
pub use value::{DimensionValue, ValueKind};
