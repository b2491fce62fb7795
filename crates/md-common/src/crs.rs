//! Coordinate Reference System types and bounding box reprojection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Semi-major axis used by the spherical Web Mercator projection.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the width of the Web Mercator square, in meters.
pub const WEB_MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Latitude limit of the Web Mercator square.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.0511287798066;

/// Well-known CRS codes the engine can reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    #[serde(rename = "EPSG:4326", alias = "CRS:84")]
    Epsg4326,
    /// Web Mercator (meters)
    #[serde(rename = "EPSG:3857", alias = "EPSG:900913")]
    Epsg3857,
    /// NAD83 Geographic
    #[serde(rename = "EPSG:4269")]
    Epsg4269,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "EPSG:900913" (legacy Google Mercator code)
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:4269" => Ok(CrsCode::Epsg4269),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Get the valid bounds for this CRS.
    pub fn valid_bounds(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            CrsCode::Epsg3857 => BoundingBox::new(
                -WEB_MERCATOR_MAX_EXTENT,
                -WEB_MERCATOR_MAX_EXTENT,
                WEB_MERCATOR_MAX_EXTENT,
                WEB_MERCATOR_MAX_EXTENT,
            ),
        }
    }

    /// Wrap an x coordinate into `[min_x, max_x)` of the valid bounds,
    /// e.g. a longitude into `[-180, 180)`.
    pub fn wrap_x(&self, x: f64) -> f64 {
        let bounds = self.valid_bounds();
        bounds.min_x + (x - bounds.min_x).rem_euclid(bounds.width())
    }

    /// Reproject a bounding box from this CRS into `target`.
    ///
    /// Longitudes are not wrapped: an easting beyond the Web Mercator square
    /// maps to a longitude beyond +/-180 so callers can detect dateline crossings.
    pub fn transform_bbox(&self, bbox: &BoundingBox, target: CrsCode) -> BoundingBox {
        match (self.is_geographic(), target.is_geographic()) {
            (true, true) | (false, false) => *bbox,
            (false, true) => BoundingBox::new(
                mercator_x_to_lon(bbox.min_x),
                mercator_y_to_lat(bbox.min_y),
                mercator_x_to_lon(bbox.max_x),
                mercator_y_to_lat(bbox.max_y),
            ),
            (true, false) => BoundingBox::new(
                lon_to_mercator_x(bbox.min_x),
                lat_to_mercator_y(bbox.min_y),
                lon_to_mercator_x(bbox.max_x),
                lat_to_mercator_y(bbox.max_y),
            ),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
            CrsCode::Epsg4269 => "EPSG:4269",
        };
        write!(f, "{}", code)
    }
}

#[inline]
fn lon_to_mercator_x(lon_deg: f64) -> f64 {
    lon_deg.to_radians() * EARTH_RADIUS
}

#[inline]
fn mercator_x_to_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS).to_degrees()
}

#[inline]
fn lat_to_mercator_y(lat_deg: f64) -> f64 {
    let lat = lat_deg.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    lat.to_radians().tan().asinh() * EARTH_RADIUS
}

#[inline]
fn mercator_y_to_lat(y: f64) -> f64 {
    (y / EARTH_RADIUS).sinh().atan().to_degrees()
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
