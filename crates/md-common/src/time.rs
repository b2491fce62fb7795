//! ISO-8601 instants and periods.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse an ISO-8601 instant. Values without an offset are taken as UTC.
///
/// Supports:
/// - Full datetime with offset: "2012-02-11T00:00:00.000Z", "2012-02-11T02:00:00+02:00"
/// - Datetime without offset: "2012-02-11T09:00:00", "2012-02-11T09:00"
/// - Date only: "2012-02-11"
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format an instant with millisecond precision and a `Z` suffix.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// An ISO-8601 period such as `P1D`, `P1M`, `PT6H` or `P1Y2M3DT4H`.
///
/// Year and month components advance on the calendar; day and time
/// components are fixed durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    months: u32,
    days: u32,
    millis: i64,
    text: String,
}

impl Period {
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let text = s.trim().to_uppercase();
        let body = text
            .strip_prefix('P')
            .ok_or_else(|| PeriodParseError::InvalidFormat(s.to_string()))?;

        let (date_part, time_part) = match body.split_once('T') {
            Some((d, t)) if !t.is_empty() => (d, Some(t)),
            Some(_) => return Err(PeriodParseError::InvalidFormat(s.to_string())),
            None => (body, None),
        };

        let mut months = 0u32;
        let mut days = 0u32;
        let mut millis = 0i64;
        let mut seen = false;

        for (amount, designator) in components(date_part, s)? {
            let whole = whole_number(amount, s)?;
            let total = match designator {
                'Y' => whole.checked_mul(12).and_then(|m| months.checked_add(m)),
                'M' => months.checked_add(whole),
                'W' => whole.checked_mul(7).and_then(|d| days.checked_add(d)),
                'D' => days.checked_add(whole),
                _ => return Err(PeriodParseError::InvalidFormat(s.to_string())),
            };
            let total = total.ok_or_else(|| PeriodParseError::OutOfRange(s.to_string()))?;
            match designator {
                'Y' | 'M' => months = total,
                _ => days = total,
            }
            seen = true;
        }

        if let Some(time_part) = time_part {
            for (amount, designator) in components(time_part, s)? {
                let scale = match designator {
                    'H' => 3_600_000.0,
                    'M' => 60_000.0,
                    'S' => 1_000.0,
                    _ => return Err(PeriodParseError::InvalidFormat(s.to_string())),
                };
                let value: f64 = amount
                    .parse()
                    .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
                if value < 0.0 || !value.is_finite() {
                    return Err(PeriodParseError::InvalidFormat(s.to_string()));
                }
                let component = (value * scale).round();
                if component >= i64::MAX as f64 {
                    return Err(PeriodParseError::OutOfRange(s.to_string()));
                }
                millis = millis
                    .checked_add(component as i64)
                    .ok_or_else(|| PeriodParseError::OutOfRange(s.to_string()))?;
                seen = true;
            }
        }

        if !seen {
            return Err(PeriodParseError::InvalidFormat(s.to_string()));
        }
        if months == 0 && days == 0 && millis == 0 {
            return Err(PeriodParseError::ZeroLength(s.to_string()));
        }

        Ok(Self {
            months,
            days,
            millis,
            text,
        })
    }

    /// The instant `count` periods after `start`, or `None` on overflow.
    ///
    /// Calendar components are applied from `start` in one step, so repeated
    /// monthly steps from Jan 31 land on month ends instead of drifting.
    pub fn advance(&self, start: &DateTime<Utc>, count: u32) -> Option<DateTime<Utc>> {
        let months = self.months.checked_mul(count)?;
        let days = i64::from(self.days).checked_mul(i64::from(count))?;
        let millis = self.millis.checked_mul(i64::from(count))?;

        start
            .checked_add_months(Months::new(months))?
            .checked_add_signed(Duration::try_days(days)?)?
            .checked_add_signed(Duration::try_milliseconds(millis)?)
    }

    /// Whether the period has a calendar (year or month) component.
    pub fn is_calendar_based(&self) -> bool {
        self.months > 0
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Period::parse(&s)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.text
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Split "1Y2M" into [("1", 'Y'), ("2", 'M')].
fn components<'a>(part: &'a str, original: &str) -> Result<Vec<(&'a str, char)>, PeriodParseError> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in part.char_indices() {
        if ch.is_ascii_alphabetic() {
            if idx == start {
                return Err(PeriodParseError::InvalidFormat(original.to_string()));
            }
            out.push((&part[start..idx], ch));
            start = idx + ch.len_utf8();
        }
    }
    if start != part.len() {
        return Err(PeriodParseError::InvalidFormat(original.to_string()));
    }
    Ok(out)
}

fn whole_number(amount: &str, original: &str) -> Result<u32, PeriodParseError> {
    amount
        .parse()
        .map_err(|_| PeriodParseError::InvalidFormat(original.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum PeriodParseError {
    #[error("Invalid ISO-8601 period: {0}")]
    InvalidFormat(String),

    #[error("Period has zero length: {0}")]
    ZeroLength(String),

    #[error("Period out of range: {0}")]
    OutOfRange(String),
}
