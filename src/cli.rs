//! # CLI Module
//!
//! Command-line interface definitions and argument parsing for solarops
//!
//! ## Key Components
//! - [`Args`] - Main CLI arguments structure
//! - [`Commands`] - Subcommand definitions
//! - [`CategoryFilter`] - Commerce / technical-service lead split
//! - [`Granularity`] - Chart series bucketing unit

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryFilter {
    All,
    Commerce,
    Technique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Granularity {
    Daily,
    Monthly,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// KPI report for a period, with trend versus the previous period (default)
    Report {
        /// Start of the period (YYYY-MM-DD); defaults to the 1st of this month
        #[arg(long)]
        since: Option<String>,

        /// End of the period (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Restrict to one lead pipeline
        #[arg(long, default_value = "all", value_enum)]
        category: CategoryFilter,

        /// Bucketing for the appended activity series
        #[arg(long, default_value = "daily", value_enum)]
        granularity: Granularity,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Per-creative ad performance joined with attributed leads
    Creatives {
        /// Start of the period (YYYY-MM-DD); defaults to the 1st of this month
        #[arg(long)]
        since: Option<String>,

        /// End of the period (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Keep only creatives whose name contains this text
        #[arg(long)]
        search: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Funnel rollup per acquisition source
    Sources {
        /// Start of the period (YYYY-MM-DD); defaults to the 1st of this month
        #[arg(long)]
        since: Option<String>,

        /// End of the period (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Company expense lines with structural cost-per-lead
    Expenses {
        /// Start of the period (YYYY-MM-DD); defaults to the 1st of this month
        #[arg(long)]
        since: Option<String>,

        /// End of the period (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Geographic rollup of leads by postal code (geocoded, cached)
    Geo {
        /// Start of the period (YYYY-MM-DD); defaults to the 1st of this month
        #[arg(long)]
        since: Option<String>,

        /// End of the period (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Skip geocoding and print counts only
        #[arg(long)]
        no_geocode: bool,
    },
    /// Latest Facebook/Instagram posts
    Posts {
        /// Maximum number of posts to display
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Update one lead on the sheet: change its status and/or append a note
    Lead {
        /// Lead id as stored in the sheet
        #[arg(long)]
        id: String,

        /// New funnel status label
        #[arg(long)]
        set_status: Option<String>,

        /// Note to append to the call history
        #[arg(long)]
        add_note: Option<String>,
    },
    /// Live auto-refreshing dashboard for the current month
    Monitor {
        /// Restrict to one lead pipeline
        #[arg(long, default_value = "all", value_enum)]
        category: CategoryFilter,

        /// Refresh frequency in seconds
        #[arg(long, default_value = "60")]
        refresh_interval: u64,
    },
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Solarops - marketing operations dashboard for Rhône Solaire"
)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Spreadsheet gateway URL (overrides SOLAROPS_SHEETS_URL)
    #[arg(long, global = true)]
    pub sheets_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
