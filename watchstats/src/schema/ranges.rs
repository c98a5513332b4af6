use crate::error::{Result, WatchStatsError};
use serde::Serialize;

/// One inclusive interval of a [`RangeTable`]. `end == None` means unbounded
/// above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub label: String,
    pub start: i64,
    pub end: Option<i64>,
}

impl Range {
    pub fn bounded(label: &str, start: i64, end: i64) -> Self {
        Range {
            label: label.to_string(),
            start,
            end: Some(end),
        }
    }

    pub fn open(label: &str, start: i64) -> Self {
        Range {
            label: label.to_string(),
            start,
            end: None,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.start && self.end.map_or(true, |end| value <= end)
    }
}

/// An ordered, contiguous, non-overlapping list of ranges.
///
/// The invariants are checked once in [`RangeTable::new`], so resolution can
/// stay a plain first-match scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeTable {
    ranges: Vec<Range>,
}

impl RangeTable {
    pub fn new(ranges: Vec<Range>) -> Result<Self> {
        if ranges.is_empty() {
            return Err(WatchStatsError::Schema("Range table is empty".into()));
        }

        for (i, range) in ranges.iter().enumerate() {
            if let Some(end) = range.end {
                if end < range.start {
                    return Err(WatchStatsError::Schema(format!(
                        "Range '{}' ends ({end}) before it starts ({})",
                        range.label, range.start
                    )));
                }
            }

            let Some(next) = ranges.get(i + 1) else {
                continue;
            };
            match range.end {
                None => {
                    return Err(WatchStatsError::Schema(format!(
                        "Unbounded range '{}' must be the last one",
                        range.label
                    )));
                }
                Some(end) if next.start <= end => {
                    return Err(WatchStatsError::Schema(format!(
                        "Ranges '{}' and '{}' overlap",
                        range.label, next.label
                    )));
                }
                Some(end) if next.start != end + 1 => {
                    return Err(WatchStatsError::Schema(format!(
                        "Gap between ranges '{}' and '{}'",
                        range.label, next.label
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(RangeTable { ranges })
    }

    /// Release-year buckets. The last bucket ends at `current_year`.
    pub fn years(current_year: i64) -> Result<Self> {
        Self::new(vec![
            Range::bounded("1890–1929", 1890, 1929),
            Range::bounded("1930–1959", 1930, 1959),
            Range::bounded("1960–1979", 1960, 1979),
            Range::bounded("1980–1999", 1980, 1999),
            Range::bounded("2000–2019", 2000, 2019),
            Range::bounded("2020–Present", 2020, current_year),
        ])
    }

    /// Runtime buckets in minutes. Covers every non-negative runtime.
    pub fn runtimes() -> Result<Self> {
        Self::new(vec![
            Range::bounded("0-40 mins", 0, 40),
            Range::bounded("41-60 mins", 41, 60),
            Range::bounded("61-90 mins", 61, 90),
            Range::bounded("91-150 mins", 91, 150),
            Range::open("151+ mins", 151),
        ])
    }

    /// Label of the first range containing `value`, if any.
    pub fn resolve(&self, value: i64) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| r.contains(value))
            .map(|r| r.label.as_str())
    }

    /// Index of the first range containing `value`, if any.
    pub fn position(&self, value: i64) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(value))
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|r| r.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_table_resolves_boundaries() {
        let years = RangeTable::years(2026).unwrap();
        assert_eq!(years.len(), 6);
        assert_eq!(years.resolve(1890), Some("1890–1929"));
        assert_eq!(years.resolve(1929), Some("1890–1929"));
        assert_eq!(years.resolve(1930), Some("1930–1959"));
        assert_eq!(years.resolve(1999), Some("1980–1999"));
        assert_eq!(years.resolve(2020), Some("2020–Present"));
        assert_eq!(years.resolve(2026), Some("2020–Present"));
    }

    #[test]
    fn test_year_table_out_of_domain() {
        let years = RangeTable::years(2026).unwrap();
        assert_eq!(years.resolve(1889), None);
        assert_eq!(years.resolve(2027), None);
        assert_eq!(years.resolve(-1), None);
    }

    #[test]
    fn test_year_table_each_year_has_one_owner() {
        let years = RangeTable::years(2026).unwrap();
        for year in 1890..=2026 {
            let owners = years.ranges().iter().filter(|r| r.contains(year)).count();
            assert_eq!(owners, 1, "year {year}");
        }
    }

    #[test]
    fn test_runtime_table_covers_non_negative() {
        let runtimes = RangeTable::runtimes().unwrap();
        for minutes in 0..=600 {
            assert!(runtimes.resolve(minutes).is_some(), "runtime {minutes}");
        }
        assert_eq!(runtimes.resolve(40), Some("0-40 mins"));
        assert_eq!(runtimes.resolve(41), Some("41-60 mins"));
        assert_eq!(runtimes.resolve(150), Some("91-150 mins"));
        assert_eq!(runtimes.resolve(151), Some("151+ mins"));
        assert_eq!(runtimes.resolve(i64::MAX), Some("151+ mins"));
        assert_eq!(runtimes.resolve(-1), None);
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(RangeTable::new(vec![]).is_err());
    }

    #[test]
    fn test_rejects_overlap() {
        let err = RangeTable::new(vec![
            Range::bounded("a", 0, 10),
            Range::bounded("b", 10, 20),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_rejects_gap() {
        let err = RangeTable::new(vec![
            Range::bounded("a", 0, 10),
            Range::bounded("b", 12, 20),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Gap"));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(RangeTable::new(vec![Range::bounded("a", 10, 0)]).is_err());
    }

    #[test]
    fn test_rejects_unbounded_before_last() {
        let err = RangeTable::new(vec![Range::open("a", 0), Range::bounded("b", 10, 20)])
            .unwrap_err();
        assert!(err.to_string().contains("last"));
    }

    #[test]
    fn test_year_table_before_2020_is_invalid() {
        // the "Present" bucket would end before it starts
        assert!(RangeTable::years(2019).is_err());
    }
}
