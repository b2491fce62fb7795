//! Interval arithmetic over ordered values.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{DomainError, Result};

/// An interval between two comparable bounds.
///
/// Construction rejects `low > high`, so every live range is well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange<T> {
    low: T,
    high: T,
    low_inclusive: bool,
    high_inclusive: bool,
}

impl<T: PartialOrd + Clone + fmt::Debug> ValueRange<T> {
    /// Closed range `[low, high]`.
    pub fn new(low: T, high: T) -> Result<Self> {
        Self::with_inclusivity(low, high, true, true)
    }

    pub fn with_inclusivity(
        low: T,
        high: T,
        low_inclusive: bool,
        high_inclusive: bool,
    ) -> Result<Self> {
        match low.partial_cmp(&high) {
            Some(Ordering::Less) | Some(Ordering::Equal) => Ok(Self {
                low,
                high,
                low_inclusive,
                high_inclusive,
            }),
            _ => Err(DomainError::invalid_range(format!(
                "low bound {:?} is greater than high bound {:?}",
                low, high
            ))),
        }
    }

    /// Degenerate closed range `[value, value]`.
    pub fn point(value: T) -> Self {
        Self {
            low: value.clone(),
            high: value,
            low_inclusive: true,
            high_inclusive: true,
        }
    }

    pub fn low(&self) -> &T {
        &self.low
    }

    pub fn high(&self) -> &T {
        &self.high
    }

    pub fn is_low_inclusive(&self) -> bool {
        self.low_inclusive
    }

    pub fn is_high_inclusive(&self) -> bool {
        self.high_inclusive
    }

    pub fn contains(&self, point: &T) -> bool {
        let above_low = match self.low.partial_cmp(point) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => self.low_inclusive,
            _ => false,
        };
        let below_high = match point.partial_cmp(&self.high) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => self.high_inclusive,
            _ => false,
        };
        above_low && below_high
    }

    /// Whether the two ranges share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        starts_before_end(&self.low, self.low_inclusive, &other.high, other.high_inclusive)
            && starts_before_end(&other.low, other.low_inclusive, &self.high, self.high_inclusive)
    }
}

impl<T: fmt::Display> fmt::Display for ValueRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.low, self.high)
    }
}

fn starts_before_end<T: PartialOrd>(start: &T, start_inc: bool, end: &T, end_inc: bool) -> bool {
    match start.partial_cmp(end) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => start_inc && end_inc,
        _ => false,
    }
}
