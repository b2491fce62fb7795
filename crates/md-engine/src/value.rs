//! Typed dimension values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use md_common::time::{format_instant, parse_instant};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The value type a dimension attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Float,
    Time,
    Text,
}

impl ValueKind {
    /// Parse a literal into a value of this kind.
    pub fn parse(&self, raw: &str) -> Result<DimensionValue, ValueParseError> {
        let trimmed = raw.trim();
        let err = || ValueParseError {
            kind: *self,
            raw: raw.to_string(),
        };

        match self {
            ValueKind::Integer => {
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(DimensionValue::Integer(v));
                }
                // "100.0" is still an integer literal for an integer column
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() && v.fract() == 0.0 => {
                        Ok(DimensionValue::Integer(v as i64))
                    }
                    _ => Err(err()),
                }
            }
            ValueKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(DimensionValue::Float)
                .ok_or_else(err),
            ValueKind::Time => parse_instant(trimmed)
                .map(DimensionValue::Time)
                .map_err(|_| err()),
            ValueKind::Text => Ok(DimensionValue::Text(raw.to_string())),
        }
    }

    /// Whether values of this kind can be bucketed by a numeric step.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Time => "time",
            ValueKind::Text => "text",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
#[error("cannot parse '{raw}' as {kind}")]
pub struct ValueParseError {
    pub kind: ValueKind,
    pub raw: String,
}

/// A single value along a dimension.
///
/// Values are totally ordered: integers and floats compare numerically with
/// each other, times chronologically and text lexicographically. Values of
/// unrelated kinds order numeric < time < text.
#[derive(Debug, Clone)]
pub enum DimensionValue {
    Integer(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Text(String),
}

impl DimensionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DimensionValue::Integer(_) => ValueKind::Integer,
            DimensionValue::Float(_) => ValueKind::Float,
            DimensionValue::Time(_) => ValueKind::Time,
            DimensionValue::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DimensionValue::Integer(v) => Some(*v as f64),
            DimensionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            DimensionValue::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Absolute distance to `other` (milliseconds for times), when defined.
    pub fn distance(&self, other: &DimensionValue) -> Option<f64> {
        match (self, other) {
            (DimensionValue::Time(a), DimensionValue::Time(b)) => {
                Some((*a - *b).num_milliseconds().unsigned_abs() as f64)
            }
            _ => Some((self.as_f64()? - other.as_f64()?).abs()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DimensionValue::Integer(_) | DimensionValue::Float(_) => 0,
            DimensionValue::Time(_) => 1,
            DimensionValue::Text(_) => 2,
        }
    }
}

impl Ord for DimensionValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use DimensionValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Time(a), Time(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let a = self.as_f64().unwrap_or(f64::NAN);
                let b = other.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for DimensionValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DimensionValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DimensionValue {}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Integer(v) => write!(f, "{}", v),
            DimensionValue::Float(v) => write!(f, "{}", format_number(*v)),
            DimensionValue::Time(t) => write!(f, "{}", format_instant(t)),
            DimensionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Render a number with a fractional part and without scientific notation:
/// `1.0`, `2.5`, `0.23722068851276978`.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

impl From<i64> for DimensionValue {
    fn from(v: i64) -> Self {
        DimensionValue::Integer(v)
    }
}

impl From<f64> for DimensionValue {
    fn from(v: f64) -> Self {
        DimensionValue::Float(v)
    }
}

impl From<DateTime<Utc>> for DimensionValue {
    fn from(v: DateTime<Utc>) -> Self {
        DimensionValue::Time(v)
    }
}

impl From<&str> for DimensionValue {
    fn from(v: &str) -> Self {
        DimensionValue::Text(v.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(v: String) -> Self {
        DimensionValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numeric_values_compare_across_kinds() {
        assert_eq!(DimensionValue::Integer(0), DimensionValue::Float(0.0));
        assert!(DimensionValue::Integer(2) < DimensionValue::Float(2.5));
        assert!(DimensionValue::Float(-1.0) < DimensionValue::Integer(0));
    }

    #[test]
    fn test_kinds_order_numeric_time_text() {
        let time = DimensionValue::Time(Utc.with_ymd_and_hms(2012, 2, 11, 0, 0, 0).unwrap());
        assert!(DimensionValue::Float(1e12) < time);
        assert!(time < DimensionValue::from("A"));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(DimensionValue::Integer(100).to_string(), "100");
        assert_eq!(DimensionValue::Float(1.0).to_string(), "1.0");
        assert_eq!(DimensionValue::Float(2.5).to_string(), "2.5");
        assert_eq!(DimensionValue::Float(1e20).to_string(), "100000000000000000000.0");
        assert_eq!(
            DimensionValue::Float(0.23722068851276978).to_string(),
            "0.23722068851276978"
        );
        assert_eq!(
            DimensionValue::Time(Utc.with_ymd_and_hms(2008, 10, 31, 0, 0, 0).unwrap()).to_string(),
            "2008-10-31T00:00:00.000Z"
        );
        assert_eq!(DimensionValue::from("CustomDimValueA").to_string(), "CustomDimValueA");
    }

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(ValueKind::Integer.parse("100").unwrap(), DimensionValue::Integer(100));
        assert_eq!(ValueKind::Integer.parse("100.0").unwrap(), DimensionValue::Integer(100));
        assert!(ValueKind::Integer.parse("2.5").is_err());
        assert_eq!(ValueKind::Float.parse(" 3.5 ").unwrap(), DimensionValue::Float(3.5));
        assert!(ValueKind::Float.parse("NaN").is_err());
        assert_eq!(
            ValueKind::Time.parse("2012-02-12T09:00").unwrap(),
            DimensionValue::Time(Utc.with_ymd_and_hms(2012, 2, 12, 9, 0, 0).unwrap())
        );
        assert!(ValueKind::Time.parse("soon").is_err());
        assert_eq!(ValueKind::Text.parse("B").unwrap(), DimensionValue::from("B"));
    }

    #[test]
    fn test_distance() {
        let a = DimensionValue::Time(Utc.with_ymd_and_hms(2012, 2, 11, 0, 0, 0).unwrap());
        let b = DimensionValue::Time(Utc.with_ymd_and_hms(2012, 2, 11, 0, 0, 1).unwrap());
        assert_eq!(a.distance(&b), Some(1000.0));
        assert_eq!(DimensionValue::Integer(1).distance(&DimensionValue::Float(3.5)), Some(2.5));
        assert_eq!(DimensionValue::from("A").distance(&DimensionValue::from("B")), None);
    }
}
