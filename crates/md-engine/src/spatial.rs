//! Spatial restriction of a domain request.
//!
//! A request box is brought into the resource's native CRS, unwrapped across
//! the antimeridian, and clipped against the dataset extent. Boxes that cover
//! the whole world collapse to no restriction at all.

use md_common::{BoundingBox, CrsCode, GridSetRegistry};
use tracing::debug;

use crate::dimension::ResourceInfo;
use crate::error::{DomainError, Result};
use crate::filter::Predicate;

/// A requested bounding box and the CRS or grid set it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRequest {
    pub bbox: BoundingBox,
    /// CRS of `bbox`; when absent the grid set's CRS, then the native CRS, applies.
    pub crs: Option<CrsCode>,
    /// Tile matrix set the request was issued against.
    pub grid_set: Option<String>,
}

impl SpatialRequest {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            crs: None,
            grid_set: None,
        }
    }

    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_grid_set(mut self, grid_set: impl Into<String>) -> Self {
        self.grid_set = Some(grid_set.into());
        self
    }
}

/// Outcome of spatial resolution, in the native CRS.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialRestriction {
    /// No spatial filter applies.
    Unrestricted,
    /// Records must overlap at least one of the boxes (two after a dateline split).
    Boxes(Vec<BoundingBox>),
    /// The request misses the dataset entirely; every query comes back empty.
    Disjoint,
}

impl SpatialRestriction {
    pub fn to_predicate(&self) -> Predicate {
        match self {
            SpatialRestriction::Unrestricted => Predicate::Include,
            SpatialRestriction::Boxes(boxes) => {
                Predicate::or(boxes.iter().copied().map(Predicate::Intersects))
            }
            SpatialRestriction::Disjoint => Predicate::Exclude,
        }
    }
}

/// Resolves request boxes against a resource's native CRS and extent.
pub struct SpatialDomainResolver<'a> {
    grid_sets: &'a GridSetRegistry,
}

impl<'a> SpatialDomainResolver<'a> {
    pub fn new(grid_sets: &'a GridSetRegistry) -> Self {
        Self { grid_sets }
    }

    pub fn resolve(
        &self,
        resource: &ResourceInfo,
        request: Option<&SpatialRequest>,
    ) -> Result<SpatialRestriction> {
        let Some(request) = request else {
            return Ok(SpatialRestriction::Unrestricted);
        };

        let request_crs = self.request_crs(resource, request)?;
        let native = resource.native_crs;

        let mut bbox = request.bbox;
        if bbox.min_y > bbox.max_y {
            return Err(DomainError::invalid_parameter(
                "bbox",
                format!("min y {} is above max y {}", bbox.min_y, bbox.max_y),
            ));
        }
        if bbox.min_x > bbox.max_x {
            // a box written east-to-west crosses the antimeridian
            let span = request_crs.valid_bounds().width();
            bbox.max_x += span;
        }

        let bbox = request_crs.transform_bbox(&bbox, native);
        if ![bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(DomainError::Projection(format!(
                "cannot reproject {:?} from {} to {}",
                request.bbox, request_crs, native
            )));
        }

        let valid = native.valid_bounds();
        if bbox.max_y < valid.min_y || bbox.min_y > valid.max_y {
            debug!(?bbox, "request box outside the valid latitude range, using full extent");
            return Ok(SpatialRestriction::Unrestricted);
        }

        let boxes = unwrap_dateline(native, &bbox);
        debug!(?boxes, crs = %native, "resolved request box");

        if boxes
            .iter()
            .any(|b| b.contains(&resource.native_extent))
        {
            return Ok(SpatialRestriction::Unrestricted);
        }

        let clipped: Vec<BoundingBox> = boxes
            .iter()
            .filter_map(|b| clip(b, &resource.native_extent))
            .collect();

        if clipped.is_empty() {
            Ok(SpatialRestriction::Disjoint)
        } else {
            Ok(SpatialRestriction::Boxes(clipped))
        }
    }

    /// CRS of the request box. A named grid set must be known even when an
    /// explicit CRS is also given.
    fn request_crs(&self, resource: &ResourceInfo, request: &SpatialRequest) -> Result<CrsCode> {
        let grid_set_crs = match &request.grid_set {
            Some(id) => Some(
                self.grid_sets
                    .get(id)
                    .map(|set| set.crs)
                    .ok_or_else(|| DomainError::UnknownGridSet(id.clone()))?,
            ),
            None => None,
        };
        Ok(request
            .crs
            .or(grid_set_crs)
            .unwrap_or(resource.native_crs))
    }
}

/// Re-wrap a box into the valid x range of `crs`.
///
/// A box at least one world wide becomes the whole valid range; a box that
/// runs past the eastern edge is split in two.
fn unwrap_dateline(crs: CrsCode, bbox: &BoundingBox) -> Vec<BoundingBox> {
    let valid = crs.valid_bounds();
    let bbox = bbox.clamp_y(valid.min_y, valid.max_y);

    if bbox.width() >= valid.width() {
        return vec![BoundingBox::new(valid.min_x, bbox.min_y, valid.max_x, bbox.max_y)];
    }

    let shifted = bbox.shifted_x(crs.wrap_x(bbox.min_x) - bbox.min_x);
    if shifted.max_x <= valid.max_x {
        return vec![shifted];
    }

    vec![
        BoundingBox::new(shifted.min_x, shifted.min_y, valid.max_x, shifted.max_y),
        BoundingBox::new(
            valid.min_x,
            shifted.min_y,
            shifted.max_x - valid.width(),
            shifted.max_y,
        ),
    ]
}

/// Intersection that keeps shared edges.
fn clip(a: &BoundingBox, b: &BoundingBox) -> Option<BoundingBox> {
    let clipped = BoundingBox::new(
        a.min_x.max(b.min_x),
        a.min_y.max(b.min_y),
        a.max_x.min(b.max_x),
        a.max_y.min(b.max_y),
    );
    (clipped.min_x <= clipped.max_x && clipped.min_y <= clipped.max_y).then_some(clipped)
}
