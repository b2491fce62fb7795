//! Command-line front end for the multidimensional domain engine.
//!
//! Loads a layer and its records from a YAML dataset and answers domain,
//! histogram and feature requests against it as JSON.

pub mod commands;
pub mod dataset;
pub mod query;

pub use commands::{execute, Command};
pub use dataset::Dataset;
pub use query::QueryArgs;
