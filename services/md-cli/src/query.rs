//! Command-line query options shared by every subcommand.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use md_common::BoundingBox;
use md_engine::{FilterParser, FilterSpec, SpatialRequest};

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Dimension filter as `dimension=value`, repeatable.
    /// Values take the usual forms: `v`, `a,b,c`, `low/high` or `start/end/period`.
    #[arg(short, long = "filter", value_name = "DIM=VALUE")]
    pub filters: Vec<String>,

    /// Spatial restriction: minx,miny,maxx,maxy[,crs]
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Grid set whose CRS the bbox is expressed in when it names none
    #[arg(long)]
    pub grid_set: Option<String>,
}

impl QueryArgs {
    /// Parse every `--filter` against the layer's dimensions.
    pub fn filters(&self, parser: &FilterParser<'_>) -> Result<Vec<FilterSpec>> {
        self.filters
            .iter()
            .map(|raw| -> Result<FilterSpec> {
                let (dimension, value) = raw
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Filter '{}' is not of the form dimension=value", raw))?;
                parser
                    .parse(dimension.trim(), value)
                    .with_context(|| format!("Invalid filter '{}'", raw))
            })
            .collect()
    }

    pub fn spatial(&self) -> Result<Option<SpatialRequest>> {
        let Some(raw) = &self.bbox else {
            return Ok(None);
        };
        let (bbox, crs) = BoundingBox::parse_with_crs(raw)
            .with_context(|| format!("Invalid bbox '{}'", raw))?;

        let mut request = SpatialRequest::new(bbox);
        if let Some(crs) = crs {
            request = request.with_crs(crs);
        }
        if let Some(grid_set) = &self.grid_set {
            request = request.with_grid_set(grid_set);
        }
        Ok(Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use md_common::CrsCode;
    use md_engine::Constraint;

    const RESOURCE: &str = r#"
resource:
  name: watertemp
  kind: raster
  native_crs: EPSG:4326
  native_extent: { min_x: 0.0, min_y: 40.0, max_x: 15.0, max_y: 45.0 }
  dimensions:
    - { name: time, attribute: ingestion, value_kind: time }
    - { name: elevation, attribute: elevation, value_kind: integer }
"#;

    fn args(filters: &[&str]) -> QueryArgs {
        QueryArgs {
            filters: filters.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_are_parsed_per_dimension() {
        let dataset = Dataset::from_yaml(RESOURCE).unwrap();
        let parser = FilterParser::new(&dataset.resource, 100);

        let filters = args(&["elevation=0,100", "time=2008-10-31T00:00:00Z/2008-11-01T00:00:00Z"])
            .filters(&parser)
            .unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].dimension, "elevation");
        assert!(matches!(filters[0].constraint, Constraint::ListOfValues(ref v) if v.len() == 2));
        assert!(matches!(filters[1].constraint, Constraint::Interval(_)));
    }

    #[test]
    fn test_malformed_filters() {
        let dataset = Dataset::from_yaml(RESOURCE).unwrap();
        let parser = FilterParser::new(&dataset.resource, 100);

        assert!(args(&["elevation"]).filters(&parser).is_err());
        assert!(args(&["depth=10"]).filters(&parser).is_err());
        let err = args(&["elevation=abc"]).filters(&parser).unwrap_err();
        assert!(err.to_string().contains("elevation=abc"));
    }

    #[test]
    fn test_spatial_request() {
        assert!(QueryArgs::default().spatial().unwrap().is_none());

        let query = QueryArgs {
            bbox: Some("1e6,1e6,2e6,2e6,EPSG:3857".to_string()),
            ..Default::default()
        };
        let spatial = query.spatial().unwrap().unwrap();
        assert_eq!(spatial.crs, Some(CrsCode::Epsg3857));
        assert_eq!(spatial.bbox.max_x, 2.0e6);

        let query = QueryArgs {
            bbox: Some("0,0,10,10".to_string()),
            grid_set: Some("WebMercatorQuad".to_string()),
            ..Default::default()
        };
        let spatial = query.spatial().unwrap().unwrap();
        assert_eq!(spatial.crs, None);
        assert_eq!(spatial.grid_set.as_deref(), Some("WebMercatorQuad"));

        let query = QueryArgs {
            bbox: Some("0,0,10".to_string()),
            ..Default::default()
        };
        assert!(query.spatial().is_err());
    }
}
