//! Subcommands and their dispatch onto the domain engine.

use anyhow::Result;
use clap::Subcommand;
use md_engine::{
    DescribeDomainsRequest, DomainEngine, DomainValuesRequest, FeatureRequest, HistogramRequest,
    RequestedDomains, SortOrder,
};
use serde_json::Value;

use crate::query::QueryArgs;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Describe the domains of several dimensions at once
    Describe {
        /// Comma separated dimension names; `bbox` adds the spatial extent.
        /// All enabled dimensions when omitted.
        #[arg(short, long, default_value = "")]
        domains: String,

        /// Largest domain enumerated in full; larger ones are contracted to min--max
        #[arg(long)]
        expand_limit: Option<usize>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Page through the distinct values of one dimension
    Values {
        /// Dimension name
        dimension: String,

        /// Page size
        #[arg(short, long)]
        limit: Option<usize>,

        /// Sort order: asc or desc
        #[arg(short, long, default_value = "asc")]
        sort: String,

        /// Only entries strictly past this value in the sort direction
        #[arg(long)]
        from_value: Option<String>,

        /// Compare the cursor against interval ends instead of starts
        #[arg(long)]
        from_end: bool,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Count matching records per bucket along one dimension
    Histogram {
        /// Dimension name
        dimension: String,

        /// Bucket width: a number or an ISO 8601 period such as P1D
        #[arg(short, long)]
        resolution: Option<String>,

        /// Explicit `low/high` bounds replacing those found in the data
        #[arg(long)]
        bounds: Option<String>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List matching records with their dimension values
    Features {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Summarize every enabled dimension without filters
    Summaries,
}

/// Run a command against an engine and return its JSON document.
pub fn execute(engine: &DomainEngine<'_>, command: &Command) -> Result<Value> {
    let parser = engine.filter_parser();

    let value = match command {
        Command::Describe {
            domains,
            expand_limit,
            query,
        } => {
            let request = DescribeDomainsRequest {
                domains: RequestedDomains::parse(domains),
                filters: query.filters(&parser)?,
                spatial: query.spatial()?,
                expand_limit: *expand_limit,
            };
            serde_json::to_value(engine.describe_domains(&request)?)?
        }
        Command::Values {
            dimension,
            limit,
            sort,
            from_value,
            from_end,
            query,
        } => {
            let request = DomainValuesRequest {
                dimension: dimension.clone(),
                filters: query.filters(&parser)?,
                spatial: query.spatial()?,
                limit: *limit,
                sort: SortOrder::parse(sort)?,
                from_value: from_value.clone(),
                from_end: *from_end,
            };
            serde_json::to_value(engine.domain_values(&request)?)?
        }
        Command::Histogram {
            dimension,
            resolution,
            bounds,
            query,
        } => {
            let request = HistogramRequest {
                dimension: dimension.clone(),
                resolution: resolution.clone(),
                filters: query.filters(&parser)?,
                spatial: query.spatial()?,
                bounds: bounds.clone(),
            };
            serde_json::to_value(engine.histogram(&request)?)?
        }
        Command::Features { query } => {
            let request = FeatureRequest {
                filters: query.filters(&parser)?,
                spatial: query.spatial()?,
            };
            serde_json::to_value(engine.features(&request)?)?
        }
        Command::Summaries => serde_json::to_value(engine.dimension_summaries()?)?,
    };

    Ok(value)
}
