//! # Time Bucket Module
//!
//! Groups filtered leads into ordered, zero-filled daily or monthly buckets
//!
//! ## Key Components
//! - [`Bucket`] - One calendar unit with its funnel counts
//! - [`bucketize`] - Build the zero-filled series for a period

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::cli::Granularity;
use crate::models::Lead;
use crate::normalize::{day_to_date, normalize_date};
use crate::period::Period;
use crate::status::{is_qualified, is_sold};

/// One calendar unit of the chart series. `key` is the stable sortable
/// identifier ("2024-03-05" daily, "2024-03" monthly); display labels are
/// a rendering concern.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    pub prospects: u64,
    pub qualified: u64,
    pub sold: u64,
}

fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Every calendar unit in the span gets a bucket up front, so gaps render
/// as zeros instead of disappearing. Each lead then increments exactly one
/// bucket by its normalized entry date; leads whose date parses to the
/// sentinel or falls outside the span are dropped silently.
pub fn bucketize(leads: &[&Lead], period: &Period, granularity: Granularity) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut cursor = period.start;
    while cursor <= period.end {
        let key = bucket_key(cursor, granularity);
        if !index.contains_key(&key) {
            index.insert(key.clone(), buckets.len());
            buckets.push(Bucket {
                key,
                ..Default::default()
            });
        }
        cursor = cursor + Duration::days(1);
    }

    for lead in leads {
        let Some(date) = day_to_date(normalize_date(&lead.date_entry)) else {
            continue;
        };
        let Some(&slot) = index.get(&bucket_key(date, granularity)) else {
            continue;
        };
        let bucket = &mut buckets[slot];
        bucket.prospects += 1;
        if is_qualified(lead) {
            bucket.qualified += 1;
        }
        if is_sold(lead) {
            bucket.sold += 1;
        }
    }

    buckets
}

/// Monthly expense-vs-acquisition series for the expense view: total
/// company spend and lead volume per month across the span.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFlow {
    pub key: String,
    pub expenses: f64,
    pub leads: u64,
}

pub fn monthly_flow(
    leads: &[&Lead],
    expenses: &[&crate::models::CompanyExpense],
    period: &Period,
) -> Vec<MonthlyFlow> {
    let mut months: Vec<MonthlyFlow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut cursor = period.start.with_day(1).unwrap_or(period.start);
    while cursor <= period.end {
        let key = cursor.format("%Y-%m").to_string();
        index.insert(key.clone(), months.len());
        months.push(MonthlyFlow {
            key,
            ..Default::default()
        });
        cursor = next_month(cursor);
    }

    for expense in expenses {
        if let Some(date) = day_to_date(normalize_date(&expense.date)) {
            if let Some(&slot) = index.get(&date.format("%Y-%m").to_string()) {
                months[slot].expenses += crate::normalize::normalize_amount(&expense.amount);
            }
        }
    }
    for lead in leads {
        if let Some(date) = day_to_date(normalize_date(&lead.date_entry)) {
            if let Some(&slot) = index.get(&date.format("%Y-%m").to_string()) {
                months[slot].leads += 1;
            }
        }
    }

    months
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date + Duration::days(31))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmountValue, CompanyExpense};

    fn lead(date: &str, status: &str) -> Lead {
        Lead {
            date_entry: date.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_series_is_zero_filled_and_ordered() {
        let leads = vec![lead("02/03/2024", "Nouveau")];
        let refs: Vec<&Lead> = leads.iter().collect();
        let period = Period::parse("2024-03-01", "2024-03-04").unwrap();

        let series = bucketize(&refs, &period, Granularity::Daily);
        let keys: Vec<&str> = series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-04"]
        );
        assert_eq!(series[0].prospects, 0);
        assert_eq!(series[1].prospects, 1);
        assert_eq!(series[3].prospects, 0);
    }

    #[test]
    fn test_each_lead_lands_in_exactly_one_bucket() {
        let leads = vec![
            lead("01/03/2024", "RDV Fixé"),
            lead("01/03/2024", "Nouveau"),
            lead("03/03/2024", "Nouveau"),
        ];
        let refs: Vec<&Lead> = leads.iter().collect();
        let period = Period::parse("2024-03-01", "2024-03-03").unwrap();

        let series = bucketize(&refs, &period, Granularity::Daily);
        let total: u64 = series.iter().map(|b| b.prospects).sum();
        assert_eq!(total, 3);
        assert_eq!(series[0].qualified, 1);
    }

    #[test]
    fn test_unparseable_dates_are_dropped_not_fatal() {
        let leads = vec![lead("??", "Nouveau"), lead("99/99/2024", "Nouveau")];
        let refs: Vec<&Lead> = leads.iter().collect();
        let period = Period::parse("2024-03-01", "2024-03-02").unwrap();

        let series = bucketize(&refs, &period, Granularity::Daily);
        assert!(series.iter().all(|b| b.prospects == 0));
    }

    #[test]
    fn test_monthly_buckets_span_boundaries() {
        let leads = vec![lead("15/02/2024", "Nouveau"), lead("02/04/2024", "Nouveau")];
        let refs: Vec<&Lead> = leads.iter().collect();
        let period = Period::parse("2024-02-01", "2024-04-30").unwrap();

        let series = bucketize(&refs, &period, Granularity::Monthly);
        let keys: Vec<&str> = series.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-02", "2024-03", "2024-04"]);
        assert_eq!(series[0].prospects, 1);
        assert_eq!(series[1].prospects, 0); // zero-filled gap month
        assert_eq!(series[2].prospects, 1);
    }

    #[test]
    fn test_monthly_flow() {
        let leads = vec![lead("15/01/2024", "Nouveau")];
        let lead_refs: Vec<&Lead> = leads.iter().collect();
        let expenses = vec![CompanyExpense {
            date: "10/02/2024".to_string(),
            amount: AmountValue::Text("1 000,00".to_string()),
            ..Default::default()
        }];
        let expense_refs: Vec<&CompanyExpense> = expenses.iter().collect();
        let period = Period::parse("2024-01-01", "2024-02-28").unwrap();

        let flow = monthly_flow(&lead_refs, &expense_refs, &period);
        assert_eq!(flow.len(), 2);
        assert_eq!(flow[0].leads, 1);
        assert_eq!(flow[0].expenses, 0.0);
        assert_eq!(flow[1].expenses, 1000.0);
    }
}
