//! Shared test utilities for the multidimensional domain workspace.
//!
//! - [`fixtures`]: the watertemp raster granules and the world-quadrant
//!   features, plus well-known boxes and CRS names
//! - [`generators`]: deterministic synthetic domains for benches and
//!   property-style tests
//! - [`paths`]: locating committed test data
//!
//! Fixtures are plain data; each crate builds its own records from them.
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;
