//! # Analytics Module
//!
//! KPI aggregation over filtered leads, expenses, and ad-spend snapshots
//!
//! ## Key Components
//! - [`KpiSet`] - Funnel counts, revenue, spend, and derived ratios
//! - [`aggregate`] - Build a [`KpiSet`] for one period and category
//! - [`trend`] - Relative delta between two periods
//! - [`TrendReport`] - Trend of every metric and every ratio

use serde::Serialize;

use crate::cli::CategoryFilter;
use crate::models::{AdPerformance, CompanyExpense, Lead};
use crate::normalize::{normalize_amount, normalize_date};
use crate::period::Period;
use crate::status::{is_qualified, is_sold, matches_category};

/// The derived numbers for one period. Recomputed on every call, never
/// persisted. Ratios are methods so they always agree with the counts.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub prospects: u64,
    pub qualified: u64,
    pub sold: u64,
    pub revenue: f64,
    pub ad_spend: f64,
    pub company_spend: f64,
}

/// Zero denominator reports as 0, never NaN or infinity. Every ratio in
/// this module goes through here.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

impl KpiSet {
    pub fn spend(&self) -> f64 {
        self.ad_spend + self.company_spend
    }

    /// Qualified share of prospects, as a percentage.
    pub fn rate_qualified(&self) -> f64 {
        ratio(self.qualified as f64, self.prospects as f64) * 100.0
    }

    /// Sold share of qualified leads, as a percentage.
    pub fn rate_sold(&self) -> f64 {
        ratio(self.sold as f64, self.qualified as f64) * 100.0
    }

    pub fn cost_per_lead(&self) -> f64 {
        ratio(self.spend(), self.prospects as f64)
    }

    pub fn cost_per_qualified(&self) -> f64 {
        ratio(self.spend(), self.qualified as f64)
    }

    pub fn cost_per_sale(&self) -> f64 {
        ratio(self.spend(), self.sold as f64)
    }

    pub fn roas(&self) -> f64 {
        ratio(self.revenue, self.spend())
    }
}

/// Aggregate one period: category pre-filter, then period filter, then
/// counts and sums. Malformed dates and amounts contribute nothing;
/// the function itself cannot fail.
pub fn aggregate(
    leads: &[Lead],
    expenses: &[CompanyExpense],
    ad_snapshots: &[AdPerformance],
    period: &Period,
    category: CategoryFilter,
) -> KpiSet {
    let in_category: Vec<&Lead> = leads
        .iter()
        .filter(|l| matches_category(category, l))
        .collect();
    let in_period: Vec<&Lead> = in_category
        .into_iter()
        .filter(|l| period.contains(normalize_date(&l.date_entry)))
        .collect();

    let prospects = in_period.len() as u64;
    let qualified = in_period.iter().filter(|l| is_qualified(l)).count() as u64;
    let sold_leads: Vec<&&Lead> = in_period.iter().filter(|l| is_sold(l)).collect();
    let sold = sold_leads.len() as u64;
    let revenue: f64 = sold_leads.iter().map(|l| normalize_amount(&l.amount)).sum();

    let ad_spend: f64 = ad_snapshots.iter().map(|s| s.spend).sum();
    let company_spend: f64 = period
        .filter(expenses, |e| normalize_date(&e.date))
        .iter()
        .map(|e| normalize_amount(&e.amount))
        .sum();

    KpiSet {
        prospects,
        qualified,
        sold,
        revenue,
        ad_spend,
        company_spend,
    }
}

/// Relative change in percent; a zero baseline reports 0 rather than
/// exploding.
pub fn trend(curr: f64, prev: f64) -> f64 {
    if prev == 0.0 {
        0.0
    } else {
        (curr - prev) / prev * 100.0
    }
}

/// Trend deltas for every absolute metric and every derived ratio. Ratios
/// are computed per period first and the trend is taken on the ratio
/// itself, never on a ratio of trends.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub prospects: f64,
    pub qualified: f64,
    pub sold: f64,
    pub revenue: f64,
    pub spend: f64,
    pub rate_qualified: f64,
    pub rate_sold: f64,
    pub cost_per_lead: f64,
    pub cost_per_qualified: f64,
    pub cost_per_sale: f64,
    pub roas: f64,
}

impl TrendReport {
    pub fn between(curr: &KpiSet, prev: &KpiSet) -> Self {
        Self {
            prospects: trend(curr.prospects as f64, prev.prospects as f64),
            qualified: trend(curr.qualified as f64, prev.qualified as f64),
            sold: trend(curr.sold as f64, prev.sold as f64),
            revenue: trend(curr.revenue, prev.revenue),
            spend: trend(curr.spend(), prev.spend()),
            rate_qualified: trend(curr.rate_qualified(), prev.rate_qualified()),
            rate_sold: trend(curr.rate_sold(), prev.rate_sold()),
            cost_per_lead: trend(curr.cost_per_lead(), prev.cost_per_lead()),
            cost_per_qualified: trend(curr.cost_per_qualified(), prev.cost_per_qualified()),
            cost_per_sale: trend(curr.cost_per_sale(), prev.cost_per_sale()),
            roas: trend(curr.roas(), prev.roas()),
        }
    }
}
