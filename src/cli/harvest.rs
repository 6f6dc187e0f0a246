//! Harvest command implementation

use crate::cli::{CliError, MarketsCommand};
use crate::fetcher::http::IndexerHttpClient;
use crate::fetcher::{FundingFetcher, MarketCatalog};
use crate::harvester::{config, HarvestPlan, HarvestRunner, RateLimiter};
use crate::output::ArchiveWriter;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Maximum allowed fan-out to prevent self-inflicted rate limiting
const MAX_CONCURRENCY: usize = 32;

/// Parse a YYYY-MM-DD calendar date
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

/// Parse and validate the fan-out width
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Funding Rate Archiver CLI
#[derive(Parser, Debug)]
#[command(name = "funding-rate-archiver")]
#[command(about = "Harvest historical funding rates for perpetual markets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Indexer base URL
    #[arg(long, global = true, default_value = config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum requests per rate-limit window
    #[arg(long, global = true, default_value_t = config::DEFAULT_MAX_REQUESTS)]
    pub max_requests: usize,

    /// Rate-limit window length in seconds
    #[arg(long, global = true, default_value_t = config::DEFAULT_WINDOW.as_secs())]
    pub window_secs: u64,

    /// Prometheus metrics listen address (metrics disabled when absent)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest funding history into per-market CSV archives
    Harvest(HarvestArgs),

    /// List the active perpetual markets
    Markets(MarketsCommand),
}

/// Arguments for the harvest command
#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Destination data root
    #[arg(long, default_value = "./data")]
    pub output_dir: PathBuf,

    /// Pre-existing data root used as the merge baseline
    /// (defaults to the destination itself)
    #[arg(long)]
    pub baseline_dir: Option<PathBuf>,

    /// Single deployment date (YYYY-MM-DD); only observations effective on
    /// this day are harvested
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// First day of the backfill range when no --date is given (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Number of concurrent per-market fetches (default: 8, max: 32)
    ///
    /// The rate limiter coordinates all concurrent requests to stay within
    /// the indexer budget; this only bounds how many fetches are in flight.
    #[arg(long, default_value = "8", value_parser = parse_concurrency)]
    pub concurrency: usize,
}

/// Build the shared indexer client from the global CLI options
pub(crate) fn build_indexer(cli: &Cli) -> Arc<IndexerHttpClient> {
    let limiter = RateLimiter::new(cli.max_requests, Duration::from_secs(cli.window_secs));
    Arc::new(IndexerHttpClient::new(cli.base_url.clone(), limiter))
}

impl HarvestArgs {
    /// Execute the harvest command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        if self.date.is_some() && self.start_date.is_some() {
            return Err(CliError::InvalidArgument(
                "--start-date cannot be combined with --date".to_string(),
            ));
        }

        let api = build_indexer(cli);
        let runner = HarvestRunner::new(
            MarketCatalog::new(api.clone()),
            FundingFetcher::new(api, self.concurrency),
            ArchiveWriter::new(self.output_dir.clone(), self.baseline_dir.clone()),
        );

        let plan = match self.date {
            Some(date) => HarvestPlan::single_day(date),
            None => {
                let start = self.start_date.unwrap_or_else(config::default_backfill_start);
                HarvestPlan::backfill(start, Utc::now().date_naive())
            }
        };

        let bar = ProgressBar::new(plan.dates().len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} days {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let report = runner
            .run_with_progress(&plan, |date| {
                bar.set_message(date.to_string());
                bar.inc(1);
            })
            .await;
        bar.finish_and_clear();

        info!(
            markets = report.markets_discovered,
            days = report.days_processed,
            written = report.markets_written,
            failed = report.markets_failed,
            lines = report.lines_written,
            "harvest finished"
        );
        Ok(())
    }
}
