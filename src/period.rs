//! # Period Module
//!
//! Inclusive calendar-day ranges used to filter and compare record sets
//!
//! ## Key Components
//! - [`Period`] - An inclusive [start, end] day range
//! - [`Period::previous`] - The equal-length range immediately before
//! - [`Period::filter`] - Keep records whose normalized date falls inside

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};

use crate::normalize::{date_to_day, DayNum};

/// An inclusive calendar-day range. Both ends count: a record dated exactly
/// on `end` belongs to the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            anyhow::bail!("period end {} is before start {}", end, start);
        }
        Ok(Self { start, end })
    }

    /// Parse the YYYY-MM-DD strings exchanged with external collaborators.
    pub fn parse(since: &str, until: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(since, "%Y-%m-%d")
            .with_context(|| format!("invalid start date '{}', expected YYYY-MM-DD", since))?;
        let end = NaiveDate::parse_from_str(until, "%Y-%m-%d")
            .with_context(|| format!("invalid end date '{}', expected YYYY-MM-DD", until))?;
        Self::new(start, end)
    }

    /// Default dashboard range: the 1st of the current month through today.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        Self {
            start: first,
            end: today,
        }
    }

    pub fn start_day(&self) -> DayNum {
        date_to_day(self.start)
    }

    pub fn end_day(&self) -> DayNum {
        date_to_day(self.end)
    }

    /// Number of calendar days covered, inclusive (a single-day period is 1).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Sentinel dates (0) are never inside any period, so parse failures
    /// stay out of every aggregate.
    pub fn contains(&self, day: DayNum) -> bool {
        day != 0 && day >= self.start_day() && day <= self.end_day()
    }

    /// The adjacent earlier period of identical length, ending the day
    /// before `start`. Used for trend comparison.
    pub fn previous(&self) -> Self {
        let prev_end = self.start - Duration::days(1);
        let prev_start = prev_end - Duration::days(self.days() - 1);
        Self {
            start: prev_start,
            end: prev_end,
        }
    }

    pub fn since(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn until(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Generic period filter: keeps records whose normalized date (as
    /// produced by `date_of`) falls inside the range.
    pub fn filter<'a, T, F>(&self, records: &'a [T], date_of: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> DayNum,
    {
        records.iter().filter(|r| self.contains(date_of(r))).collect()
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.since(), self.until())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lead;
    use crate::normalize::normalize_date;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_bounds() {
        let p = Period::parse("2024-03-01", "2024-03-05").unwrap();
        assert_eq!(p.days(), 5);
        assert!(p.contains(20240301));
        assert!(p.contains(20240305));
        assert!(!p.contains(20240306));
        assert!(!p.contains(20240229));
        assert!(!p.contains(0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Period::parse("01/03/2024", "2024-03-05").is_err());
        assert!(Period::parse("2024-03-05", "2024-03-01").is_err());
    }

    #[test]
    fn test_previous_is_adjacent_and_equal_length() {
        let p = Period::parse("2024-03-10", "2024-03-16").unwrap();
        let prev = p.previous();
        assert_eq!(prev.days(), p.days());
        assert_eq!(prev.end, date(2024, 3, 9));
        assert_eq!(prev.start, date(2024, 3, 3));
        // Non-overlapping, immediately adjacent.
        assert_eq!(prev.end + Duration::days(1), p.start);
    }

    #[test]
    fn test_previous_single_day() {
        let p = Period::parse("2024-03-01", "2024-03-01").unwrap();
        let prev = p.previous();
        assert_eq!(prev.start, date(2024, 2, 29));
        assert_eq!(prev.end, date(2024, 2, 29));
        assert_eq!(prev.days(), 1);
    }

    #[test]
    fn test_previous_crosses_month_and_year() {
        let p = Period::parse("2024-01-01", "2024-01-31").unwrap();
        let prev = p.previous();
        assert_eq!(prev.start, date(2023, 12, 1));
        assert_eq!(prev.end, date(2023, 12, 31));
    }

    #[test]
    fn test_month_to_date() {
        let p = Period::month_to_date(date(2024, 3, 17));
        assert_eq!(p.start, date(2024, 3, 1));
        assert_eq!(p.end, date(2024, 3, 17));
    }

    #[test]
    fn test_filter_drops_sentinels_and_out_of_range() {
        let mk = |d: &str| Lead {
            date_entry: d.to_string(),
            ..Default::default()
        };
        let leads = vec![
            mk("01/03/2024"),
            mk("05/03/2024"),
            mk("06/03/2024"),
            mk("pas une date"),
        ];
        let p = Period::parse("2024-03-01", "2024-03-05").unwrap();
        let kept = p.filter(&leads, |l| normalize_date(&l.date_entry));
        assert_eq!(kept.len(), 2);
    }
}
