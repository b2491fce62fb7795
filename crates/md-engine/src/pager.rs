//! Cursor-resumable paging over a materialized domain.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DomainError, Result};
use crate::extractor::DomainResult;
use crate::range::ValueRange;
use crate::value::DimensionValue;

/// Sort order of a domain page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" | "asc" | "ascending" => Ok(Self::Ascending),
            "d" | "desc" | "descending" => Ok(Self::Descending),
            other => Err(DomainError::invalid_parameter(
                "sort",
                format!("expected 'asc' or 'desc', got '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Caller-supplied paging state. There is no server-side session: the next
/// page is requested by passing the last value seen as `from_value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub sort: SortOrder,
    pub from_value: Option<DimensionValue>,
    /// Key the cursor and the sort on the end of each interval.
    pub from_end: bool,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_from_value(mut self, value: impl Into<DimensionValue>) -> Self {
        self.from_value = Some(value.into());
        self
    }

    pub fn with_from_end(mut self, from_end: bool) -> Self {
        self.from_end = from_end;
        self
    }
}

/// One page of a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: DomainResult,
    /// Entries left after the cursor, before the limit was applied.
    pub total: usize,
    pub limit: usize,
    pub sort: SortOrder,
}

impl Page {
    /// Entries in this page.
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct DomainPager {
    default_limit: usize,
    max_limit: usize,
}

impl DomainPager {
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// The limit actually applied for a client value.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            None => self.default_limit.min(self.max_limit),
            Some(limit) if limit >= self.max_limit => {
                if limit > self.max_limit {
                    info!(
                        requested = limit,
                        max = self.max_limit,
                        "domain values limit clamped to maximum"
                    );
                }
                self.max_limit
            }
            Some(limit) => limit,
        }
    }

    pub fn page(&self, domain: DomainResult, request: &PageRequest) -> Page {
        let limit = self.effective_limit(request.limit);
        let sort = request.sort;

        let (entries, total) = match domain {
            DomainResult::ValueSet(mut values) => {
                if let Some(cursor) = &request.from_value {
                    values.retain(|v| past_cursor(v, cursor, sort));
                }
                values.sort();
                if sort == SortOrder::Descending {
                    values.reverse();
                }
                let total = values.len();
                values.truncate(limit);
                (DomainResult::ValueSet(values), total)
            }
            DomainResult::IntervalSet(mut intervals) => {
                let from_end = request.from_end;
                if let Some(cursor) = &request.from_value {
                    intervals.retain(|r| past_cursor(interval_key(r, from_end), cursor, sort));
                }
                intervals.sort_by(|a, b| compare_intervals(a, b, from_end));
                if sort == SortOrder::Descending {
                    intervals.reverse();
                }
                let total = intervals.len();
                intervals.truncate(limit);
                (DomainResult::IntervalSet(intervals), total)
            }
        };

        Page {
            entries,
            total,
            limit,
            sort,
        }
    }
}

fn past_cursor(value: &DimensionValue, cursor: &DimensionValue, sort: SortOrder) -> bool {
    match sort {
        SortOrder::Ascending => value > cursor,
        SortOrder::Descending => value < cursor,
    }
}

fn interval_key(range: &ValueRange<DimensionValue>, from_end: bool) -> &DimensionValue {
    if from_end {
        range.high()
    } else {
        range.low()
    }
}

fn compare_intervals(
    a: &ValueRange<DimensionValue>,
    b: &ValueRange<DimensionValue>,
    from_end: bool,
) -> Ordering {
    if from_end {
        a.high().cmp(b.high()).then_with(|| a.low().cmp(b.low()))
    } else {
        a.low().cmp(b.low()).then_with(|| a.high().cmp(b.high()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pager() -> DomainPager {
        DomainPager::new(1000, 100_000)
    }

    fn elevations() -> DomainResult {
        DomainResult::ValueSet(vec![1.0.into(), 2.0.into(), 3.0.into(), 5.0.into()])
    }

    fn values(page: &Page) -> Vec<DimensionValue> {
        match &page.entries {
            DomainResult::ValueSet(values) => values.clone(),
            DomainResult::IntervalSet(_) => panic!("expected values"),
        }
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::parse("ASC").unwrap(), SortOrder::Ascending);
        assert_eq!(SortOrder::parse("desc").unwrap(), SortOrder::Descending);
        assert!(matches!(
            SortOrder::parse("sideways"),
            Err(DomainError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_limit_and_cursor() {
        let page = pager().page(elevations(), &PageRequest::new().with_limit(3));
        assert_eq!(values(&page), vec![1.0.into(), 2.0.into(), 3.0.into()]);
        assert_eq!(page.total, 4);
        assert_eq!(page.size(), 3);

        let page = pager().page(
            elevations(),
            &PageRequest::new().with_limit(3).with_from_value(3.0),
        );
        assert_eq!(values(&page), vec![5.0.into()]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_cursor_past_end_is_empty() {
        let page = pager().page(elevations(), &PageRequest::new().with_from_value(5.0));
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_descending() {
        let request = PageRequest::new()
            .with_limit(3)
            .with_sort(SortOrder::Descending);
        let page = pager().page(elevations(), &request);
        assert_eq!(values(&page), vec![5.0.into(), 3.0.into(), 2.0.into()]);

        let page = pager().page(elevations(), &request.with_from_value(2.0));
        assert_eq!(values(&page), vec![1.0.into()]);
    }

    #[test]
    fn test_page_size_one_walks_domain_once() {
        for sort in [SortOrder::Ascending, SortOrder::Descending] {
            let mut seen = Vec::new();
            let mut cursor: Option<DimensionValue> = None;
            loop {
                let mut request = PageRequest::new().with_limit(1).with_sort(sort);
                request.from_value = cursor.clone();
                let page = pager().page(elevations(), &request);
                let Some(value) = values(&page).into_iter().next() else {
                    break;
                };
                seen.push(value.clone());
                cursor = Some(value);
            }
            let mut expected = vec![1.0.into(), 2.0.into(), 3.0.into(), 5.0.into()];
            if sort == SortOrder::Descending {
                expected.reverse();
            }
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_interval_cursor_from_end() {
        let domain = DomainResult::IntervalSet(vec![
            ValueRange::new(1.0.into(), 2.0.into()).unwrap(),
            ValueRange::new(2.0.into(), 3.0.into()).unwrap(),
            ValueRange::new(3.0.into(), 4.0.into()).unwrap(),
            ValueRange::new(5.0.into(), 7.0.into()).unwrap(),
        ]);
        let request = PageRequest::new()
            .with_limit(3)
            .with_from_value(3.5)
            .with_from_end(true);
        let page = pager().page(domain.clone(), &request);
        match page.entries {
            DomainResult::IntervalSet(intervals) => {
                let rendered: Vec<String> = intervals.iter().map(|r| r.to_string()).collect();
                assert_eq!(rendered, vec!["3.0/4.0", "5.0/7.0"]);
            }
            DomainResult::ValueSet(_) => panic!("expected intervals"),
        }

        // keyed on start, 3.5 only leaves the last interval
        let page = pager().page(domain, &request.with_from_end(false));
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_limit_clamping() {
        let pager = DomainPager::new(10, 100);
        assert_eq!(pager.effective_limit(None), 10);
        assert_eq!(pager.effective_limit(Some(50)), 50);
        assert_eq!(pager.effective_limit(Some(100)), 100);
        assert_eq!(pager.effective_limit(Some(5000)), 100);
        assert_eq!(pager.effective_limit(Some(0)), 0);
    }
}
