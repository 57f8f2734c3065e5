use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::clusters::Cluster;
use crate::error::Result;
use crate::time_utils::ReportPeriod;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// GPU-hour usage reporting for JADE
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jade-usage",
    about = "GPU-hour usage reporting for JADE",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level
    #[arg(long, global = true, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Export all job data in a period to a csv file
    Export(ExportArgs),
    /// Display a report of GPU hour usage, optionally filtered by a list of
    /// usernames or accounts
    Report(ReportArgs),
}

/// The reporting window shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// The earliest date (inclusive) in iso format (YYYY-MM-DD)
    #[arg(value_parser = parse_date)]
    pub start: NaiveDate,

    /// The latest date (exclusive) in iso format (YYYY-MM-DD)
    #[arg(value_parser = parse_date)]
    pub end: NaiveDate,
}

impl PeriodArgs {
    pub fn period(&self) -> Result<ReportPeriod> {
        ReportPeriod::new(self.start, self.end)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub period: PeriodArgs,

    /// Username to attempt to login with
    pub user: String,

    /// Directory to write usage data files to
    #[arg(long, default_value = "./")]
    pub output_dir: PathBuf,

    /// Cluster to fetch usage from
    #[arg(long, default_value = "jade2", value_parser = parse_cluster)]
    pub cluster: Cluster,

    /// JSON file overriding cluster addresses and capacities
    #[arg(long)]
    pub cluster_config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub period: PeriodArgs,

    /// Files or directories containing usage data in the format created by
    /// the export command
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Prefix of accounts to select
    #[arg(long)]
    pub account_prefix: Option<String>,

    /// Comma separated list of accounts to select
    #[arg(long, value_delimiter = ',')]
    pub accounts: Vec<String>,

    /// Comma separated list of user names to select
    #[arg(long, value_delimiter = ',')]
    pub users: Vec<String>,

    /// DAILY quota of GPU hours, if used your quota utilisation will be printed
    #[arg(long)]
    pub quota: Option<u64>,

    /// Cluster the usage data was collected on
    #[arg(long, default_value = "jade2", value_parser = parse_cluster)]
    pub cluster: Cluster,

    /// JSON file overriding cluster addresses and capacities
    #[arg(long)]
    pub cluster_config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Settings {
    /// The effective log level, with `--debug` taking precedence.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}

fn parse_cluster(s: &str) -> std::result::Result<Cluster, String> {
    s.parse::<Cluster>().map_err(|e| e.to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
