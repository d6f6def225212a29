//! # Monitor Module
//!
//! Live auto-refreshing dashboard for the current month
//!
//! ## Key Components
//! - [`handle_monitor_command`] - Main monitoring command handler
//! - [`monitor_iteration`] - One fetch-aggregate-render pass

use std::io::{self, Write};
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::Local;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    terminal::{Clear, ClearType},
};
use tokio::{signal, time::sleep};

use crate::ads;
use crate::analytics::{aggregate, TrendReport};
use crate::cli::CategoryFilter;
use crate::config::Config;
use crate::period::Period;
use crate::report;
use crate::sheets::SheetsClient;

pub async fn handle_monitor_command(
    config: &Config,
    category: CategoryFilter,
    refresh_interval: u64,
) -> Result<()> {
    config.require_sheets()?;
    if refresh_interval == 0 {
        anyhow::bail!("Refresh interval must be at least 1 second");
    }

    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), Hide)?;

    let result = run_monitor(config, category, refresh_interval, &mut stdout).await;

    execute!(stdout, Show)?;
    if result.is_ok() {
        println!("\n{}Monitoring arrêté.{}", "\x1b[96m", "\x1b[0m");
    }
    result
}

async fn run_monitor(
    config: &Config,
    category: CategoryFilter,
    refresh_interval: u64,
    stdout: &mut io::Stdout,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                break;
            }
            result = monitor_iteration(config, category, refresh_interval, stdout) => {
                result?;
            }
        }
    }
    Ok(())
}

/// One pass: fetch every source for the current range, aggregate, render.
/// The snapshot is local to the pass, so a slow response can never bleed
/// into a later iteration's numbers.
async fn monitor_iteration(
    config: &Config,
    category: CategoryFilter,
    refresh_interval: u64,
    stdout: &mut io::Stdout,
) -> Result<()> {
    execute!(stdout, MoveTo(0, 0))?;

    let period = Period::month_to_date(Local::now().date_naive());
    let previous = period.previous();
    let client = SheetsClient::new(&config.sheets_url);

    let (leads, expenses, fb_curr, fb_prev, g_curr, g_prev) = tokio::join!(
        client.fetch_leads(),
        client.fetch_expenses(),
        ads::fetch_facebook_performance(config, &period),
        ads::fetch_facebook_performance(config, &previous),
        ads::fetch_google_performance(config, &period),
        ads::fetch_google_performance(config, &previous),
    );

    match leads {
        Ok(leads) => {
            let current = aggregate(&leads, &expenses, &[fb_curr, g_curr], &period, category);
            let prev = aggregate(&leads, &expenses, &[fb_prev, g_prev], &previous, category);
            let trends = TrendReport::between(&current, &prev);

            print!(
                "{}",
                report::format_kpi_report(&period, &current, &prev, &trends, &fb_curr, &g_curr)
            );
            println!(
                "\n  \x1b[90m{}  ·  rafraîchissement {}s  ·  Ctrl+C pour quitter\x1b[0m",
                Local::now().format("%H:%M:%S"),
                refresh_interval
            );
        }
        Err(e) => {
            println!("Erreur de synchronisation: {:#}", e);
            println!("Nouvel essai dans {}s", refresh_interval);
        }
    }

    execute!(stdout, Clear(ClearType::FromCursorDown))?;
    stdout.flush()?;

    sleep(StdDuration::from_secs(refresh_interval)).await;
    Ok(())
}
