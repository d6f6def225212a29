//! # Normalization Module
//!
//! Turns the sheet's loosely-formatted dates and amounts into comparable values
//!
//! ## Key Components
//! - [`normalize_date`] - Parse heterogeneous date strings into a day number
//! - [`normalize_amount`] - Parse locale-formatted currency values
//! - [`day_to_date`] / [`date_to_day`] - Bridge to `NaiveDate` at the boundary

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::AmountValue;

lazy_static::lazy_static! {
    static ref DMY_RE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})").unwrap();
    static ref ISO_RE: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").unwrap();
}

/// Canonical comparable form for calendar days: `year*10000 + month*100 + day`.
/// This integer is the ONLY date representation inside the engine; chrono
/// types appear at the boundaries. 0 is the sentinel for unparseable input
/// and sorts before every valid date.
pub type DayNum = i32;

/// Parse a date as the sheet delivers it: ISO `YYYY-MM-DD` (with optional
/// `T...` tail) or `D/M/YY[YY]` (with optional trailing time after a space).
/// Two-digit years map to 2000+. No timezone math: these are calendar days,
/// not instants.
pub fn normalize_date(raw: &str) -> DayNum {
    let mut s = raw.trim();
    if s.is_empty() {
        return 0;
    }
    if let Some(idx) = s.find('T') {
        s = &s[..idx];
    }

    if let Some(caps) = DMY_RE.captures(s) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let mut year: i32 = caps[3].parse().unwrap_or(0);
        if year < 100 {
            year += 2000;
        }
        return pack_day(year, month, day);
    }

    if let Some(caps) = ISO_RE.captures(s) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        return pack_day(year, month, day);
    }

    0
}

/// Validates through chrono so "32/13/2024" comes back as the sentinel
/// rather than a nonsense integer.
fn pack_day(year: i32, month: u32, day: u32) -> DayNum {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(_) => year * 10_000 + month as i32 * 100 + day as i32,
        None => 0,
    }
}

pub fn date_to_day(date: NaiveDate) -> DayNum {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

pub fn day_to_date(day: DayNum) -> Option<NaiveDate> {
    if day <= 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(day / 10_000, (day % 10_000 / 100) as u32, (day % 100) as u32)
}

/// Numeric amounts pass through untouched; strings are stripped of every
/// whitespace variant the sheet produces (plain, no-break U+00A0, narrow
/// no-break U+202F used as French thousands separators), then of anything
/// outside digits/comma/dot/minus, with the comma as decimal separator.
/// Unparseable input contributes 0, and the whole thing is idempotent.
pub fn normalize_amount(value: &AmountValue) -> f64 {
    match value {
        AmountValue::Number(n) => *n,
        AmountValue::Text(s) => parse_amount_str(s),
    }
}

fn parse_amount_str(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}' && *c != '\u{202F}')
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_dates() {
        assert_eq!(normalize_date("2024-03-05"), 20240305);
        assert_eq!(normalize_date("2024-03-05T14:30:00Z"), 20240305);
        assert_eq!(normalize_date(" 2024-12-31 "), 20241231);
    }

    #[test]
    fn test_slash_dates() {
        assert_eq!(normalize_date("5/3/2024"), 20240305);
        assert_eq!(normalize_date("05/03/2024"), 20240305);
        assert_eq!(normalize_date("05/03/24"), 20240305);
        assert_eq!(normalize_date("05/03/2024 14:30"), 20240305);
    }

    #[test]
    fn test_two_digit_years_map_to_2000s() {
        assert_eq!(normalize_date("1/1/99"), 20990101);
        assert_eq!(normalize_date("1/1/00"), 20000101);
    }

    #[test]
    fn test_garbage_is_sentinel() {
        assert_eq!(normalize_date(""), 0);
        assert_eq!(normalize_date("   "), 0);
        assert_eq!(normalize_date("n/a"), 0);
        assert_eq!(normalize_date("demain"), 0);
        assert_eq!(normalize_date("32/13/2024"), 0);
        assert_eq!(normalize_date("2024-13-40"), 0);
    }

    #[test]
    fn test_sentinel_sorts_before_valid_dates() {
        assert!(0 < normalize_date("1/1/2000"));
    }

    #[test]
    fn test_day_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let day = date_to_day(date);
        assert_eq!(day, 20240305);
        assert_eq!(day_to_date(day), Some(date));
        assert_eq!(day_to_date(0), None);
    }

    #[test]
    fn test_normalize_is_stable_under_reformat() {
        // Formatting a parsed date back out and re-parsing lands on the
        // same day number.
        let day = normalize_date("07/06/24");
        let date = day_to_date(day).unwrap();
        assert_eq!(normalize_date(&date.format("%Y-%m-%d").to_string()), day);
    }

    #[test]
    fn test_amounts_french_locale() {
        assert_eq!(
            normalize_amount(&AmountValue::Text("1 234,56".into())),
            1234.56
        );
        assert_eq!(
            normalize_amount(&AmountValue::Text("1\u{202F}234,56 €".into())),
            1234.56
        );
        assert_eq!(
            normalize_amount(&AmountValue::Text("1\u{00A0}500".into())),
            1500.0
        );
        assert_eq!(normalize_amount(&AmountValue::Text("-42,5".into())), -42.5);
    }

    #[test]
    fn test_amounts_passthrough_and_fallback() {
        assert_eq!(normalize_amount(&AmountValue::Number(42.0)), 42.0);
        assert_eq!(normalize_amount(&AmountValue::Text("".into())), 0.0);
        assert_eq!(normalize_amount(&AmountValue::Text("n/a".into())), 0.0);
    }

    #[test]
    fn test_amount_idempotent() {
        let once = normalize_amount(&AmountValue::Text("1 234,56".into()));
        let twice = normalize_amount(&AmountValue::Number(once));
        assert_eq!(once, twice);
    }
}
