//! Common types shared across the multidimensional domain crates.

pub mod bbox;
pub mod crs;
pub mod gridset;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox};
pub use crs::{CrsCode, CrsParseError};
pub use gridset::{GridSetRegistry, TileMatrixSet};
pub use time::{format_instant, parse_instant, Period, PeriodParseError, TimeParseError};
