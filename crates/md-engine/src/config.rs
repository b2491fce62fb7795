//! Configuration for the domain engine.

use serde::{Deserialize, Serialize};

use crate::histogram::HistogramStrategy;

/// Engine-wide limits and strategy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Domains with at most this many entries render enumerated.
    pub expand_limit_default: usize,

    /// Ceiling for client-supplied expand limits.
    pub expand_limit_max: usize,

    /// Page size when the client gives no limit.
    pub values_limit_default: usize,

    /// Ceiling for client-supplied page sizes.
    pub values_limit_max: usize,

    /// Largest `start/end/period` filter expanded into a list of instants.
    pub max_enumerated_instants: usize,

    /// Largest number of buckets a histogram may have.
    pub max_histogram_buckets: usize,

    /// Where histogram counts are computed.
    pub histogram_strategy: HistogramStrategy,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            expand_limit_default: 1000,
            expand_limit_max: 100_000,
            values_limit_default: 1000,
            values_limit_max: 100_000,
            max_enumerated_instants: 100,
            max_histogram_buckets: 10_000,
            histogram_strategy: HistogramStrategy::InMemory,
        }
    }
}

impl DomainConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MD_DOMAIN_EXPAND_LIMIT") {
            if let Ok(limit) = val.parse() {
                config.expand_limit_default = limit;
            }
        }

        if let Ok(val) = std::env::var("MD_DOMAIN_EXPAND_LIMIT_MAX") {
            if let Ok(limit) = val.parse() {
                config.expand_limit_max = limit;
            }
        }

        if let Ok(val) = std::env::var("MD_GET_DOMAIN_VALUES_LIMIT") {
            if let Ok(limit) = val.parse() {
                config.values_limit_default = limit;
            }
        }

        if let Ok(val) = std::env::var("MD_GET_DOMAIN_VALUES_LIMIT_MAX") {
            if let Ok(limit) = val.parse() {
                config.values_limit_max = limit;
            }
        }

        if let Ok(val) = std::env::var("MD_MAX_ENUMERATED_INSTANTS") {
            if let Ok(count) = val.parse() {
                config.max_enumerated_instants = count;
            }
        }

        if let Ok(val) = std::env::var("MD_MAX_HISTOGRAM_BUCKETS") {
            if let Ok(count) = val.parse() {
                config.max_histogram_buckets = count;
            }
        }

        if let Ok(val) = std::env::var("MD_HISTOGRAM_STRATEGY") {
            if let Some(strategy) = HistogramStrategy::from_str(&val) {
                config.histogram_strategy = strategy;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.expand_limit_default > self.expand_limit_max {
            return Err("expand_limit_default must not exceed expand_limit_max".to_string());
        }

        if self.values_limit_max == 0 {
            return Err("values_limit_max must be > 0".to_string());
        }

        if self.values_limit_default > self.values_limit_max {
            return Err("values_limit_default must not exceed values_limit_max".to_string());
        }

        if self.max_histogram_buckets == 0 {
            return Err("max_histogram_buckets must be > 0".to_string());
        }

        Ok(())
    }
}
