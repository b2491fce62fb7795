//! Tile matrix set (grid set) definitions.
//!
//! A tiled request names the grid set it was issued against instead of a CRS;
//! the registry maps that identifier back to the CRS of the request box.

use crate::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};

/// A tile matrix set, reduced to what is needed to interpret request boxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMatrixSet {
    /// Identifier for the tile matrix set
    pub identifier: String,

    /// Coordinate reference system
    pub crs: CrsCode,

    /// Bounding box of the tile matrix set
    pub bounding_box: BoundingBox,

    /// Well-known scale set URI (optional)
    #[serde(default)]
    pub well_known_scale_set: Option<String>,

    /// Other identifiers this set is known by
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TileMatrixSet {
    /// Check whether `identifier` names this set.
    pub fn matches(&self, identifier: &str) -> bool {
        self.identifier == identifier || self.aliases.iter().any(|a| a == identifier)
    }
}

/// Standard Web Mercator (Google/OSM) tile matrix set.
pub fn web_mercator_tile_matrix_set() -> TileMatrixSet {
    TileMatrixSet {
        identifier: "WebMercatorQuad".to_string(),
        crs: CrsCode::Epsg3857,
        bounding_box: CrsCode::Epsg3857.valid_bounds(),
        well_known_scale_set: Some(
            "http://www.opengis.net/def/wkss/OGC/1.0/GoogleMapsCompatible".to_string(),
        ),
        aliases: vec!["EPSG:900913".to_string(), "EPSG:3857".to_string()],
    }
}

/// Standard WGS84 (geographic) tile matrix set.
pub fn wgs84_tile_matrix_set() -> TileMatrixSet {
    TileMatrixSet {
        identifier: "WorldCRS84Quad".to_string(),
        crs: CrsCode::Epsg4326,
        bounding_box: CrsCode::Epsg4326.valid_bounds(),
        well_known_scale_set: Some(
            "http://www.opengis.net/def/wkss/OGC/1.0/GoogleCRS84Quad".to_string(),
        ),
        aliases: vec!["EPSG:4326".to_string()],
    }
}

/// Lookup table of the grid sets known to a deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridSetRegistry {
    sets: Vec<TileMatrixSet>,
}

impl GridSetRegistry {
    /// Registry holding the two well-known world grid sets.
    pub fn well_known() -> Self {
        Self {
            sets: vec![wgs84_tile_matrix_set(), web_mercator_tile_matrix_set()],
        }
    }

    /// Add a grid set, replacing any set with the same identifier.
    pub fn register(&mut self, set: TileMatrixSet) {
        self.sets.retain(|s| s.identifier != set.identifier);
        self.sets.push(set);
    }

    /// Find a grid set by identifier or alias.
    pub fn get(&self, identifier: &str) -> Option<&TileMatrixSet> {
        self.sets.iter().find(|s| s.matches(identifier))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_identifier_and_alias() {
        let registry = GridSetRegistry::well_known();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("WebMercatorQuad").map(|s| s.crs),
            Some(CrsCode::Epsg3857)
        );
        assert_eq!(
            registry.get("EPSG:900913").map(|s| s.crs),
            Some(CrsCode::Epsg3857)
        );
        assert_eq!(
            registry.get("EPSG:4326").map(|s| s.crs),
            Some(CrsCode::Epsg4326)
        );
        assert!(registry.get("EPSG:4326_unknown").is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = GridSetRegistry::well_known();
        let mut custom = wgs84_tile_matrix_set();
        custom.aliases = vec!["GlobalCRS84Geometric".to_string()];
        registry.register(custom);

        assert_eq!(registry.len(), 2);
        assert!(registry.get("GlobalCRS84Geometric").is_some());
        assert!(registry.get("EPSG:4326").is_none());
    }
}
