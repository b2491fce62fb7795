//! Common test fixtures for domain engine tests.
//!
//! Fixtures are plain data so that any crate in the workspace can build its
//! own records from them without depending on the engine.

/// Common bounding box definitions for testing, as `(min_x, min_y, max_x, max_y)`.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Footprint shared by every watertemp granule
    pub const WATERTEMP: (f64, f64, f64, f64) = (
        0.23722068851276978,
        40.562080748421806,
        14.592757149389236,
        44.55808294568743,
    );

    /// Inside the watertemp footprint
    pub const ADRIATIC: (f64, f64, f64, f64) = (12.0, 42.0, 14.0, 44.0);

    /// Crosses the antimeridian (Pacific-centric), min_x > max_x
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);

    /// Spans more than one full turn of longitude
    pub const WRAPPING: (f64, f64, f64, f64) = (-200.0, -90.0, 200.0, 90.0);

    /// Entirely east of the valid longitude range
    pub const ROLLED_EAST: (f64, f64, f64, f64) = (190.0, 10.0, 200.0, 20.0);

    /// Southern hemisphere, away from every watertemp granule
    pub const SOUTH_ATLANTIC: (f64, f64, f64, f64) = (-30.0, -40.0, -10.0, -20.0);
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// Lon/lat order alias of EPSG:4326
    pub const CRS_84: &str = "CRS:84";
}

/// Raster mosaic of sea water temperature: two elevations times two days.
pub mod watertemp {
    /// Layer name
    pub const LAYER: &str = "watertemp";

    /// One granule row of the mosaic index.
    #[derive(Debug, Clone, Copy)]
    pub struct Granule {
        pub location: &'static str,
        pub elevation: i64,
        pub time: &'static str,
        pub custom: &'static str,
    }

    pub const GRANULES: [Granule; 4] = [
        Granule {
            location: "NCOM_wattemp_000_20081031T0000000_12.tiff",
            elevation: 0,
            time: "2008-10-31T00:00:00Z",
            custom: "CustomDimValueA",
        },
        Granule {
            location: "NCOM_wattemp_100_20081031T0000000_12.tiff",
            elevation: 100,
            time: "2008-10-31T00:00:00Z",
            custom: "CustomDimValueB",
        },
        Granule {
            location: "NCOM_wattemp_000_20081101T0000000_12.tiff",
            elevation: 0,
            time: "2008-11-01T00:00:00Z",
            custom: "CustomDimValueB",
        },
        Granule {
            location: "NCOM_wattemp_100_20081101T0000000_12.tiff",
            elevation: 100,
            time: "2008-11-01T00:00:00Z",
            custom: "CustomDimValueC",
        },
    ];
}

/// Vector layer of four world quadrants with time and elevation ranges.
pub mod quadrants {
    /// Feature type name
    pub const LAYER: &str = "ElevationWithStartEnd";

    /// One feature of the layer.
    #[derive(Debug, Clone, Copy)]
    pub struct Feature {
        pub bbox: (f64, f64, f64, f64),
        pub start_time: &'static str,
        pub end_time: &'static str,
        pub start_elevation: f64,
        pub end_elevation: f64,
    }

    pub const FEATURES: [Feature; 4] = [
        Feature {
            bbox: (-180.0, -90.0, 0.0, 0.0),
            start_time: "2012-02-11T00:00:00Z",
            end_time: "2012-02-11T11:00:00Z",
            start_elevation: 1.0,
            end_elevation: 2.0,
        },
        Feature {
            bbox: (0.0, -90.0, 180.0, 0.0),
            start_time: "2012-02-12T00:00:00Z",
            end_time: "2012-02-12T10:00:00Z",
            start_elevation: 2.0,
            end_elevation: 3.0,
        },
        Feature {
            bbox: (-180.0, 0.0, 0.0, 90.0),
            start_time: "2012-02-11T00:00:00Z",
            end_time: "2012-02-13T00:00:00Z",
            start_elevation: 3.0,
            end_elevation: 4.0,
        },
        Feature {
            bbox: (0.0, 0.0, 180.0, 90.0),
            start_time: "2012-02-11T00:00:00Z",
            end_time: "2012-02-13T00:00:00Z",
            start_elevation: 5.0,
            end_elevation: 7.0,
        },
    ];
}
