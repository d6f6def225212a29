//! # Commands Module
//!
//! Command handlers wiring the fetch clients to the aggregation engine
//!
//! ## Key Components
//! - [`handle_report_command`] - KPI report with previous-period trends
//! - [`handle_creatives_command`] - Creative attribution join
//! - [`handle_sources_command`] - Source funnel rollup
//! - [`handle_lead_command`] - Status change / note append write path

use anyhow::{Context, Result};
use chrono::Local;
use log::debug;

use crate::ads;
use crate::analytics::{aggregate, TrendReport};
use crate::bucket::{bucketize, monthly_flow};
use crate::cli::{CategoryFilter, Granularity};
use crate::config::Config;
use crate::geocode::{geocode_batch, postal_breakdown, FileCache};
use crate::joiner::{join_by_name, source_breakdown, JoinTotals};
use crate::models::Lead;
use crate::normalize::normalize_date;
use crate::period::Period;
use crate::report;
use crate::sheets::SheetsClient;
use crate::status::matches_category;

/// CLI date arguments fall back to the dashboard default: the current
/// month to date.
pub fn resolve_period(since: Option<&str>, until: Option<&str>) -> Result<Period> {
    let default = Period::month_to_date(Local::now().date_naive());
    match (since, until) {
        (None, None) => Ok(default),
        (s, u) => Period::parse(
            s.unwrap_or(&default.since()),
            u.unwrap_or(&default.until()),
        ),
    }
}

pub async fn handle_report_command(
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
    category: CategoryFilter,
    granularity: Granularity,
    json: bool,
) -> Result<()> {
    config.require_sheets()?;
    let period = resolve_period(since, until)?;
    let previous = period.previous();
    let client = SheetsClient::new(&config.sheets_url);

    // Independent sources, fetched together; the aggregation below only
    // runs on this one coherent snapshot.
    let (leads, expenses, fb_curr, fb_prev, g_curr, g_prev) = tokio::join!(
        client.fetch_leads(),
        client.fetch_expenses(),
        ads::fetch_facebook_performance(config, &period),
        ads::fetch_facebook_performance(config, &previous),
        ads::fetch_google_performance(config, &period),
        ads::fetch_google_performance(config, &previous),
    );
    let leads = leads?;
    debug!(
        "Aggregating {} leads / {} expenses over {}",
        leads.len(),
        expenses.len(),
        period
    );

    let current_kpis = aggregate(&leads, &expenses, &[fb_curr, g_curr], &period, category);
    let previous_kpis = aggregate(&leads, &expenses, &[fb_prev, g_prev], &previous, category);
    let trends = TrendReport::between(&current_kpis, &previous_kpis);

    let in_category: Vec<&Lead> = leads
        .iter()
        .filter(|l| matches_category(category, l))
        .collect();
    let series = bucketize(&in_category, &period, granularity);

    if json {
        let output =
            report::generate_json_report(&period, &current_kpis, &previous_kpis, &trends, series);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}",
            report::format_kpi_report(
                &period,
                &current_kpis,
                &previous_kpis,
                &trends,
                &fb_curr,
                &g_curr
            )
        );
        println!("{}", report::format_series_table(&series));
    }
    Ok(())
}

pub async fn handle_creatives_command(
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    config.require_sheets()?;
    config.require_facebook()?;
    let period = resolve_period(since, until)?;
    let client = SheetsClient::new(&config.sheets_url);

    let (leads, creatives) = tokio::join!(
        client.fetch_leads(),
        ads::fetch_creative_performance(config, &period),
    );
    let leads = leads?;

    let in_period = period.filter(&leads, |l| normalize_date(&l.date_entry));
    let mut joined = join_by_name(&creatives, &in_period, |l| l.creative.as_str());

    if let Some(term) = search {
        let needle = term.to_lowercase();
        joined.retain(|j| j.record.name.to_lowercase().contains(&needle));
    }
    joined.sort_by(|a, b| {
        b.record
            .spend
            .partial_cmp(&a.record.spend)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let totals = JoinTotals::over(&joined);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "since": period.since(),
                "until": period.until(),
                "totals": totals,
                "creatives": joined,
            }))?
        );
    } else {
        println!("{}", report::format_creatives_table(&joined, &totals));
    }
    Ok(())
}

pub async fn handle_sources_command(
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
    json: bool,
) -> Result<()> {
    config.require_sheets()?;
    let period = resolve_period(since, until)?;
    let client = SheetsClient::new(&config.sheets_url);

    let leads = client.fetch_leads().await?;
    let in_period = period.filter(&leads, |l| normalize_date(&l.date_entry));
    let sources = source_breakdown(&in_period);

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
    } else {
        println!("{}", report::format_sources_table(&sources));
    }
    Ok(())
}

pub async fn handle_expenses_command(
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
    json: bool,
) -> Result<()> {
    config.require_sheets()?;
    let period = resolve_period(since, until)?;
    let client = SheetsClient::new(&config.sheets_url);

    let (leads, expenses) = tokio::join!(client.fetch_leads(), client.fetch_expenses());
    let leads = leads?;

    let expenses_in_period = period.filter(&expenses, |e| normalize_date(&e.date));
    let leads_in_period = period.filter(&leads, |l| normalize_date(&l.date_entry));

    let total: f64 = expenses_in_period
        .iter()
        .map(|e| crate::normalize::normalize_amount(&e.amount))
        .sum();
    // Structural CPL: company spend only, against all prospects entered.
    let structural_cpl = if leads_in_period.is_empty() {
        0.0
    } else {
        total / leads_in_period.len() as f64
    };

    let lead_refs: Vec<&Lead> = leads.iter().collect();
    let expense_refs: Vec<&crate::models::CompanyExpense> = expenses.iter().collect();
    let flow = monthly_flow(&lead_refs, &expense_refs, &period);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "since": period.since(),
                "until": period.until(),
                "total": total,
                "structuralCpl": structural_cpl,
                "lines": expenses_in_period,
                "monthlyFlow": flow,
            }))?
        );
    } else {
        println!(
            "{}",
            report::format_expenses_table(&expenses_in_period, total, structural_cpl, &flow)
        );
    }
    Ok(())
}

pub async fn handle_geo_command(
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
    no_geocode: bool,
) -> Result<()> {
    config.require_sheets()?;
    let period = resolve_period(since, until)?;
    let client = SheetsClient::new(&config.sheets_url);

    let leads = client.fetch_leads().await?;
    let in_period = period.filter(&leads, |l| normalize_date(&l.date_entry));
    let mut stats = postal_breakdown(&in_period);

    if !no_geocode {
        let codes: Vec<String> = stats.iter().map(|s| s.code.clone()).collect();
        let mut cache = FileCache::open(&config.cache_dir);
        let resolved = geocode_batch(&codes, &mut cache).await;
        for row in &mut stats {
            row.coord = resolved.get(&row.code).copied();
        }
    }

    println!("{}", report::format_geo_table(&stats));
    Ok(())
}

pub async fn handle_posts_command(config: &Config, limit: usize) -> Result<()> {
    let posts = ads::fetch_social_feed(config).await;
    println!("{}", report::format_posts(&posts, limit));
    Ok(())
}

pub async fn handle_lead_command(
    config: &Config,
    id: &str,
    set_status: Option<&str>,
    add_note: Option<&str>,
) -> Result<()> {
    config.require_sheets()?;
    if set_status.is_none() && add_note.is_none() {
        anyhow::bail!("Nothing to change: pass --set-status and/or --add-note");
    }
    let client = SheetsClient::new(&config.sheets_url);

    let leads = client.fetch_leads().await?;
    let mut lead = leads
        .into_iter()
        .find(|l| l.id == id)
        .with_context(|| format!("No lead with id '{}' on the sheet", id))?;

    if let Some(status) = set_status {
        lead.status = status.to_string();
    }
    if let Some(note) = add_note {
        // Call history is append-only; earlier notes stay untouched.
        lead.notes.push(note.to_string());
    }

    client.update_lead(&lead).await?;
    println!(
        "Lead {} mis à jour (statut: {}, étape: {:?}, {} notes)",
        lead.id,
        lead.status,
        crate::status::stage(&lead),
        lead.notes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_resolve_period_defaults_to_month_to_date() {
        let period = resolve_period(None, None).unwrap();
        let today = Local::now().date_naive();
        assert_eq!(period.end, today);
        assert_eq!(period.start.day(), 1);
    }

    #[test]
    fn test_resolve_period_explicit() {
        let period = resolve_period(Some("2024-03-01"), Some("2024-03-05")).unwrap();
        assert_eq!(period.days(), 5);
        assert!(resolve_period(Some("garbage"), None).is_err());
    }
}
