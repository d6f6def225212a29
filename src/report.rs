//! # Report Display Module
//!
//! Terminal tables and JSON output for the dashboard views
//!
//! ## Key Components
//! - [`format_kpi_report`] - KPI block with trend badges vs the previous period
//! - [`format_series_table`] - Daily/monthly activity series
//! - [`format_creatives_table`] - Creative join results
//! - [`JsonReport`] - Machine-readable mirror of the report view

use serde::Serialize;

use crate::analytics::{KpiSet, TrendReport};
use crate::bucket::{Bucket, MonthlyFlow};
use crate::geocode::PostalStats;
use crate::joiner::{JoinTotals, JoinedCreative, SourceStats};
use crate::models::{AdPerformance, CompanyExpense, SocialPost};
use crate::period::Period;

const GRAY: &str = "\x1b[90m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const WHITE: &str = "\x1b[97m";
const RESET: &str = "\x1b[0m";

/// French-locale number rendering: space thousands separator, comma
/// decimals. This is what the sales team reads all day in the sheet.
pub fn format_eur(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let mut int_part = String::new();
    let digits = whole.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            int_part.push(' ');
        }
        int_part.push(c);
    }

    format!(
        "{}{},{:02} €",
        if negative { "-" } else { "" },
        int_part,
        frac
    )
}

pub fn format_count(n: u64) -> String {
    let mut result = String::new();
    let digits = n.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(' ');
        }
        result.push(c);
    }
    result
}

/// Trend badge: arrow + signed percentage. `inverted` flips the coloring
/// for metrics where down is good (costs).
fn trend_badge(value: f64, inverted: bool) -> String {
    let good = if inverted { value < 0.0 } else { value > 0.0 };
    let color = if value == 0.0 {
        GRAY
    } else if good {
        GREEN
    } else {
        RED
    };
    let arrow = if value > 0.0 {
        "↑"
    } else if value < 0.0 {
        "↓"
    } else {
        "→"
    };
    format!("{}{} {:+.1}%{}", color, arrow, value, RESET)
}

fn banner(title: &str) -> String {
    let inner = format!("  {}  ", title);
    let width = inner.chars().count();
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(" ╭{}╮\n", "─".repeat(width)));
    out.push_str(&format!(" │{}│\n", " ".repeat(width)));
    out.push_str(&format!(" │{}│\n", inner));
    out.push_str(&format!(" │{}│\n", " ".repeat(width)));
    out.push_str(&format!(" ╰{}╯\n", "─".repeat(width)));
    out.push('\n');
    out
}

fn kpi_line(label: &str, value: &str, badge: &str) -> String {
    format!("  {WHITE}{:<18}{RESET} {:>14}   {}\n", label, value, badge)
}

/// The results view: funnel counts, unit costs, profitability block.
pub fn format_kpi_report(
    period: &Period,
    current: &KpiSet,
    previous: &KpiSet,
    trends: &TrendReport,
    facebook: &AdPerformance,
    google: &AdPerformance,
) -> String {
    let mut out = banner("Rhône Solaire — Performance Globale");

    out.push_str(&format!(
        "  {GRAY}Période {}  ·  vs {}{RESET}\n\n",
        period,
        period.previous()
    ));

    out.push_str(&kpi_line(
        "Prospects",
        &format_count(current.prospects),
        &trend_badge(trends.prospects, false),
    ));
    out.push_str(&kpi_line(
        "Qualifiés",
        &format!(
            "{} ({:.1}%)",
            format_count(current.qualified),
            current.rate_qualified()
        ),
        &trend_badge(trends.qualified, false),
    ));
    out.push_str(&kpi_line(
        "Ventes",
        &format!("{} ({:.1}%)", format_count(current.sold), current.rate_sold()),
        &trend_badge(trends.sold, false),
    ));
    out.push('\n');

    out.push_str(&kpi_line(
        "CPL",
        &format_eur(current.cost_per_lead()),
        &trend_badge(trends.cost_per_lead, true),
    ));
    out.push_str(&kpi_line(
        "CP Qualifié",
        &format_eur(current.cost_per_qualified()),
        &trend_badge(trends.cost_per_qualified, true),
    ));
    out.push_str(&kpi_line(
        "CP Vente",
        &format_eur(current.cost_per_sale()),
        &trend_badge(trends.cost_per_sale, true),
    ));
    out.push('\n');

    out.push_str(&kpi_line(
        "Investissement",
        &format_eur(current.spend()),
        &trend_badge(trends.spend, true),
    ));
    out.push_str(&format!(
        "  {GRAY}  Meta {}  ·  Google {}  ·  Structure {}{RESET}\n",
        format_eur(facebook.spend),
        format_eur(google.spend),
        format_eur(current.company_spend)
    ));
    out.push_str(&kpi_line(
        "CA généré",
        &format_eur(current.revenue),
        &trend_badge(trends.revenue, false),
    ));
    out.push_str(&format!(
        "  {WHITE}{:<18}{RESET} {YELLOW}{:>13.2}x{RESET}   {}\n",
        "ROAS",
        current.roas(),
        trend_badge(trends.roas, false)
    ));

    out.push_str(&format!(
        "\n  {GRAY}Période précédente : {} prospects · {} qualifiés · {} ventes · {}{RESET}\n",
        format_count(previous.prospects),
        format_count(previous.qualified),
        format_count(previous.sold),
        format_eur(previous.spend())
    ));

    out
}

/// Activity series: one row per bucket, zero rows included.
pub fn format_series_table(series: &[Bucket]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{GRAY}┌────────────┬───────────┬───────────┬───────────┐{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET}{CYAN} Date       {RESET}{GRAY}│{RESET}{CYAN} Prospects {RESET}{GRAY}│{RESET}{CYAN} Qualifiés {RESET}{GRAY}│{RESET}{CYAN}    Ventes {RESET}{GRAY}│{RESET}\n"
    ));

    let mut totals = (0u64, 0u64, 0u64);
    for bucket in series {
        out.push_str(&format!(
            "{GRAY}│{RESET} {:<10} {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>9} {GRAY}│{RESET}\n",
            bucket.key, bucket.prospects, bucket.qualified, bucket.sold
        ));
        totals.0 += bucket.prospects;
        totals.1 += bucket.qualified;
        totals.2 += bucket.sold;
    }

    out.push_str(&format!(
        "{GRAY}├────────────┼───────────┼───────────┼───────────┤{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET} {GREEN}Total{RESET}      {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>9} {GRAY}│{RESET}\n",
        totals.0, totals.1, totals.2
    ));
    out.push_str(&format!(
        "{GRAY}└────────────┴───────────┴───────────┴───────────┘{RESET}\n"
    ));
    out
}

pub fn format_creatives_table(joined: &[JoinedCreative], totals: &JoinTotals) -> String {
    let mut out = banner("Analyse Créatives — Meta Ads");

    out.push_str(&format!(
        "  Budget engagé {YELLOW}{}{RESET}  ·  Leads {WHITE}{}{RESET}  ·  CPL période {YELLOW}{}{RESET}\n",
        format_eur(totals.spend),
        format_count(totals.lead_count),
        format_eur(totals.average_cpl())
    ));

    out.push_str(&format!(
        "\n{GRAY}┌──────────────────────────────────────┬────────────┬───────┬────────────┬────────┐{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET}{CYAN} Créative                             {RESET}{GRAY}│{RESET}{CYAN}    Dépense {RESET}{GRAY}│{RESET}{CYAN} Leads {RESET}{GRAY}│{RESET}{CYAN}        CPL {RESET}{GRAY}│{RESET}{CYAN}    CTR {RESET}{GRAY}│{RESET}\n"
    ));

    for item in joined {
        let mut name: String = item.record.name.chars().take(36).collect();
        if item.record.name.chars().count() > 36 {
            name.push('…');
        }
        let cpl_color = if item.lead_count == 0 { RED } else { RESET };
        out.push_str(&format!(
            "{GRAY}│{RESET} {:<36} {GRAY}│{RESET} {:>10} {GRAY}│{RESET} {:>5} {GRAY}│{RESET}{cpl_color} {:>10} {RESET}{GRAY}│{RESET} {:>5.2}% {GRAY}│{RESET}\n",
            name,
            format_eur(item.record.spend),
            item.lead_count,
            format_eur(item.cost_per_lead),
            item.ctr
        ));
    }

    out.push_str(&format!(
        "{GRAY}└──────────────────────────────────────┴────────────┴───────┴────────────┴────────┘{RESET}\n"
    ));
    if joined.iter().any(|j| j.lead_count == 0) {
        out.push_str(&format!(
            "  {GRAY}CPL en rouge : dépense sans lead attribuable (montant complet, non amorti){RESET}\n"
        ));
    }
    out
}

pub fn format_sources_table(sources: &[SourceStats]) -> String {
    let mut out = banner("Sources d'Acquisition");

    out.push_str(&format!(
        "{GRAY}┌──────────────────────────┬────────┬───────────┬──────────┬─────────┬────────────┐{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET}{CYAN} Canal                    {RESET}{GRAY}│{RESET}{CYAN}  Leads {RESET}{GRAY}│{RESET}{CYAN} Qualifiés {RESET}{GRAY}│{RESET}{CYAN} Taux Qu. {RESET}{GRAY}│{RESET}{CYAN}  Ventes {RESET}{GRAY}│{RESET}{CYAN} Conversion {RESET}{GRAY}│{RESET}\n"
    ));

    for source in sources {
        let mut name: String = source.name.chars().take(24).collect();
        if source.name.chars().count() > 24 {
            name.push('…');
        }
        out.push_str(&format!(
            "{GRAY}│{RESET} {:<24} {GRAY}│{RESET} {:>6} {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>7.1}% {GRAY}│{RESET} {:>7} {GRAY}│{RESET} {:>9.1}% {GRAY}│{RESET}\n",
            name,
            source.leads,
            source.qualified,
            source.rate_qualified(),
            source.sold,
            source.rate_conversion()
        ));
    }

    out.push_str(&format!(
        "{GRAY}└──────────────────────────┴────────┴───────────┴──────────┴─────────┴────────────┘{RESET}\n"
    ));
    out
}

pub fn format_expenses_table(
    expenses: &[&CompanyExpense],
    total: f64,
    structural_cpl: f64,
    flow: &[MonthlyFlow],
) -> String {
    let mut out = banner("Dépenses Société (hors SEA)");

    out.push_str(&format!(
        "  Total {YELLOW}{}{RESET}  ·  CPL structurel {YELLOW}{}{RESET}  ·  {} lignes\n\n",
        format_eur(total),
        format_eur(structural_cpl),
        expenses.len()
    ));

    out.push_str(&format!(
        "{GRAY}┌──────────────────────────────┬──────────────────┬────────────┬────────────┐{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET}{CYAN} Libellé                      {RESET}{GRAY}│{RESET}{CYAN} Type             {RESET}{GRAY}│{RESET}{CYAN}    Montant {RESET}{GRAY}│{RESET}{CYAN}       Date {RESET}{GRAY}│{RESET}\n"
    ));

    for expense in expenses {
        let mut name: String = expense.name.chars().take(28).collect();
        if expense.name.chars().count() > 28 {
            name.push('…');
        }
        let mut kind: String = expense.expense_type.chars().take(16).collect();
        if expense.expense_type.chars().count() > 16 {
            kind.push('…');
        }
        out.push_str(&format!(
            "{GRAY}│{RESET} {:<28} {GRAY}│{RESET} {:<16} {GRAY}│{RESET} {:>10} {GRAY}│{RESET} {:>10} {GRAY}│{RESET}\n",
            name,
            kind,
            format_eur(crate::normalize::normalize_amount(&expense.amount)),
            expense.date
        ));
    }
    out.push_str(&format!(
        "{GRAY}└──────────────────────────────┴──────────────────┴────────────┴────────────┘{RESET}\n"
    ));

    if !flow.is_empty() {
        out.push_str(&format!("\n  {WHITE}Évolution mensuelle{RESET}\n"));
        for month in flow {
            out.push_str(&format!(
                "  {:<8} {:>12}   {GRAY}{} leads{RESET}\n",
                month.key,
                format_eur(month.expenses),
                month.leads
            ));
        }
    }
    out
}

pub fn format_geo_table(stats: &[PostalStats]) -> String {
    let mut out = banner("Répartition Géographique");

    out.push_str(&format!(
        "{GRAY}┌─────────┬───────┬────────┬───────────┬─────────┬─────────────────────┐{RESET}\n"
    ));
    out.push_str(&format!(
        "{GRAY}│{RESET}{CYAN} Code    {RESET}{GRAY}│{RESET}{CYAN} Dépt  {RESET}{GRAY}│{RESET}{CYAN}  Leads {RESET}{GRAY}│{RESET}{CYAN} Qualifiés {RESET}{GRAY}│{RESET}{CYAN}  Ventes {RESET}{GRAY}│{RESET}{CYAN} Position            {RESET}{GRAY}│{RESET}\n"
    ));

    for row in stats {
        let position = row
            .coord
            .map(|(lat, lng)| format!("{:.4}, {:.4}", lat, lng))
            .unwrap_or_else(|| "—".to_string());
        out.push_str(&format!(
            "{GRAY}│{RESET} {:<7} {GRAY}│{RESET} {:<5} {GRAY}│{RESET} {:>6} {GRAY}│{RESET} {:>9} {GRAY}│{RESET} {:>7} {GRAY}│{RESET} {:<19} {GRAY}│{RESET}\n",
            row.code, row.department, row.leads, row.qualified, row.sold, position
        ));
    }

    out.push_str(&format!(
        "{GRAY}└─────────┴───────┴────────┴───────────┴─────────┴─────────────────────┘{RESET}\n"
    ));
    out
}

pub fn format_posts(posts: &[SocialPost], limit: usize) -> String {
    let mut out = banner("Flux Social — Facebook & Instagram");

    for post in posts.iter().take(limit) {
        let date: String = post.created_time.chars().take(10).collect();
        let mut message: String = post.message.replace('\n', " ").chars().take(70).collect();
        if post.message.chars().count() > 70 {
            message.push('…');
        }
        out.push_str(&format!(
            "  {GRAY}{}{RESET} {CYAN}{:<9}{RESET} {WHITE}{}{RESET}\n           {GRAY}♥ {}  💬 {}  {}{RESET}\n",
            date, post.platform, message, post.likes_count, post.comments_count, post.permalink_url
        ));
    }
    if posts.is_empty() {
        out.push_str(&format!("  {GRAY}Aucune publication récupérée{RESET}\n"));
    }
    out
}

/// Machine-readable mirror of the report view. Ratios are materialized so
/// consumers get the zero-denominator policy already applied.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonKpis {
    pub prospects: u64,
    pub qualified: u64,
    pub sold: u64,
    pub revenue: f64,
    pub ad_spend: f64,
    pub company_spend: f64,
    pub spend: f64,
    pub rate_qualified: f64,
    pub rate_sold: f64,
    pub cost_per_lead: f64,
    pub cost_per_qualified: f64,
    pub cost_per_sale: f64,
    pub roas: f64,
}

impl From<&KpiSet> for JsonKpis {
    fn from(kpis: &KpiSet) -> Self {
        Self {
            prospects: kpis.prospects,
            qualified: kpis.qualified,
            sold: kpis.sold,
            revenue: kpis.revenue,
            ad_spend: kpis.ad_spend,
            company_spend: kpis.company_spend,
            spend: kpis.spend(),
            rate_qualified: kpis.rate_qualified(),
            rate_sold: kpis.rate_sold(),
            cost_per_lead: kpis.cost_per_lead(),
            cost_per_qualified: kpis.cost_per_qualified(),
            cost_per_sale: kpis.cost_per_sale(),
            roas: kpis.roas(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub since: String,
    pub until: String,
    pub current: JsonKpis,
    pub previous: JsonKpis,
    pub trends: TrendReport,
    pub series: Vec<Bucket>,
}

pub fn generate_json_report(
    period: &Period,
    current: &KpiSet,
    previous: &KpiSet,
    trends: &TrendReport,
    series: Vec<Bucket>,
) -> JsonReport {
    JsonReport {
        since: period.since(),
        until: period.until(),
        current: JsonKpis::from(current),
        previous: JsonKpis::from(previous),
        trends: *trends,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eur() {
        assert_eq!(format_eur(1234.56), "1 234,56 €");
        assert_eq!(format_eur(0.0), "0,00 €");
        assert_eq!(format_eur(-42.5), "-42,50 €");
        assert_eq!(format_eur(1_000_000.0), "1 000 000,00 €");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(12345), "12 345");
    }

    #[test]
    fn test_zero_prospects_report_formats_zero_cpl() {
        let kpis = KpiSet {
            company_spend: 1234.56,
            ..Default::default()
        };
        let json = JsonKpis::from(&kpis);
        assert_eq!(json.cost_per_lead, 0.0);
        assert_eq!(format_eur(json.cost_per_lead), "0,00 €");
    }

    #[test]
    fn test_series_table_lists_every_bucket() {
        let series = vec![
            Bucket {
                key: "2024-03-01".to_string(),
                prospects: 2,
                qualified: 1,
                sold: 0,
            },
            Bucket {
                key: "2024-03-02".to_string(),
                ..Default::default()
            },
        ];
        let table = format_series_table(&series);
        assert!(table.contains("2024-03-01"));
        assert!(table.contains("2024-03-02"));
        assert!(table.contains("Total"));
    }

    #[test]
    fn test_json_report_is_complete_on_empty_inputs() {
        let period = Period::parse("2024-03-01", "2024-03-05").unwrap();
        let kpis = KpiSet::default();
        let trends = TrendReport::between(&kpis, &kpis);
        let report = generate_json_report(&period, &kpis, &kpis, &trends, Vec::new());
        let value = serde_json::to_value(&report).unwrap();
        // Every field present, nothing null or NaN.
        assert_eq!(value["current"]["costPerLead"], 0.0);
        assert_eq!(value["trends"]["roas"], 0.0);
        assert_eq!(value["since"], "2024-03-01");
    }
}
