use std::collections::BTreeSet;

use crate::error::{Result, RetailError};
use crate::models::TransactionRecord;

/// Inclusive `[start, end]` pair of `YYYY-MM` labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: String,
    pub end: String,
}

/// Distinct, sorted `year_month` labels of the full table. The range slider's
/// integer positions index into this list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodIndex {
    labels: Vec<String>,
}

impl PeriodIndex {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let set: BTreeSet<&str> = records.iter().map(|r| r.year_month.as_str()).collect();
        Self {
            labels: set.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(String::as_str)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// Slider positions covering every period. `None` for an empty index.
    pub fn full_range(&self) -> Option<(usize, usize)> {
        (!self.is_empty()).then(|| (0, self.len() - 1))
    }

    /// Translate slider positions into labels. Requires `lo <= hi <= len - 1`.
    pub fn resolve(&self, lo: usize, hi: usize) -> Result<PeriodRange> {
        let invalid = || RetailError::InvalidPeriodRange {
            lo,
            hi,
            len: self.len(),
        };
        if lo > hi {
            return Err(invalid());
        }
        match (self.get(lo), self.get(hi)) {
            (Some(start), Some(end)) => Ok(PeriodRange {
                start: start.to_string(),
                end: end.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Label-based bounds (as typed on the command line) to slider positions.
    /// A missing bound means the first or last period.
    pub fn resolve_labels(&self, from: Option<&str>, to: Option<&str>) -> Result<(usize, usize)> {
        let (first, last) = self.full_range().ok_or(RetailError::InvalidPeriodRange {
            lo: 0,
            hi: 0,
            len: 0,
        })?;
        let lookup = |label: &str| {
            self.position(label)
                .ok_or_else(|| RetailError::UnknownPeriod(label.to_string()))
        };
        let lo = from.map(lookup).transpose()?.unwrap_or(first);
        let hi = to.map(lookup).transpose()?.unwrap_or(last);
        if lo > hi {
            return Err(RetailError::InvalidPeriodRange {
                lo,
                hi,
                len: self.len(),
            });
        }
        Ok((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(y: i32, m: u32, d: u32) -> TransactionRecord {
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        TransactionRecord::new("1", "MUG", 1, 1.0, date, "United Kingdom")
    }

    fn index() -> PeriodIndex {
        PeriodIndex::from_records(&[
            record(2011, 2, 3),
            record(2010, 12, 1),
            record(2011, 1, 9),
            record(2011, 2, 20),
        ])
    }

    #[test]
    fn test_labels_are_distinct_and_sorted() {
        assert_eq!(index().labels(), &["2010-12", "2011-01", "2011-02"]);
        assert_eq!(index().full_range(), Some((0, 2)));
        assert_eq!(PeriodIndex::default().full_range(), None);
    }

    #[test]
    fn test_resolve() {
        let idx = index();
        let r = idx.resolve(0, 1).unwrap();
        assert_eq!(r.start, "2010-12");
        assert_eq!(r.end, "2011-01");
        let same = idx.resolve(2, 2).unwrap();
        assert_eq!(same.start, same.end);
    }

    #[test]
    fn test_resolve_rejects_out_of_bounds() {
        let idx = index();
        assert!(matches!(
            idx.resolve(2, 1),
            Err(RetailError::InvalidPeriodRange { lo: 2, hi: 1, len: 3 })
        ));
        assert!(idx.resolve(0, 3).is_err());
    }

    #[test]
    fn test_resolve_labels() {
        let idx = index();
        assert_eq!(idx.resolve_labels(None, None).unwrap(), (0, 2));
        assert_eq!(idx.resolve_labels(Some("2011-01"), None).unwrap(), (1, 2));
        assert_eq!(idx.resolve_labels(None, Some("2010-12")).unwrap(), (0, 0));
        assert!(matches!(
            idx.resolve_labels(Some("2012-05"), None),
            Err(RetailError::UnknownPeriod(_))
        ));
        assert!(idx.resolve_labels(Some("2011-02"), Some("2010-12")).is_err());
    }
}
