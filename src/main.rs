//! # Solarops
//!
//! Terminal marketing-operations dashboard for Rhône Solaire
//!
//! ## Key Components
//! - [`commands`] - One handler per dashboard view
//! - [`analytics`] - The KPI aggregation engine
//! - [`monitor`] - Live auto-refreshing dashboard

mod ads;
mod analytics;
mod bucket;
mod cli;
mod commands;
mod config;
mod geocode;
mod joiner;
mod models;
mod monitor;
mod normalize;
mod period;
mod report;
mod sheets;
mod status;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Args, CategoryFilter, Commands, Granularity};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = Config::from_env(args.sheets_url.clone());

    match args.command {
        Some(Commands::Report {
            since,
            until,
            category,
            granularity,
            json,
        }) => {
            commands::handle_report_command(
                &config,
                since.as_deref(),
                until.as_deref(),
                category,
                granularity,
                json,
            )
            .await
        }
        Some(Commands::Creatives {
            since,
            until,
            search,
            json,
        }) => {
            commands::handle_creatives_command(
                &config,
                since.as_deref(),
                until.as_deref(),
                search.as_deref(),
                json,
            )
            .await
        }
        Some(Commands::Sources { since, until, json }) => {
            commands::handle_sources_command(&config, since.as_deref(), until.as_deref(), json)
                .await
        }
        Some(Commands::Expenses { since, until, json }) => {
            commands::handle_expenses_command(&config, since.as_deref(), until.as_deref(), json)
                .await
        }
        Some(Commands::Geo {
            since,
            until,
            no_geocode,
        }) => {
            commands::handle_geo_command(&config, since.as_deref(), until.as_deref(), no_geocode)
                .await
        }
        Some(Commands::Posts { limit }) => commands::handle_posts_command(&config, limit).await,
        Some(Commands::Lead {
            id,
            set_status,
            add_note,
        }) => {
            commands::handle_lead_command(
                &config,
                &id,
                set_status.as_deref(),
                add_note.as_deref(),
            )
            .await
        }
        Some(Commands::Monitor {
            category,
            refresh_interval,
        }) => monitor::handle_monitor_command(&config, category, refresh_interval).await,
        // No subcommand: the report view is what the team opens first.
        None => {
            commands::handle_report_command(
                &config,
                None,
                None,
                CategoryFilter::All,
                Granularity::Daily,
                false,
            )
            .await
        }
    }
}
