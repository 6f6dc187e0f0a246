//! Harvest run orchestration

use crate::fetcher::{FundingFetcher, MarketCatalog};
use crate::harvester::{accumulate, HarvestPlan, MarketOutcome, RunReport};
use crate::output::ArchiveWriter;
use crate::FundingSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Drives a harvest run: one catalog fetch, a fetch-and-accumulate pass per
/// processing day, then one persist per non-empty market series
pub struct HarvestRunner {
    catalog: MarketCatalog,
    fetcher: FundingFetcher,
    writer: ArchiveWriter,
}

impl HarvestRunner {
    /// Create a runner from its collaborators
    pub fn new(catalog: MarketCatalog, fetcher: FundingFetcher, writer: ArchiveWriter) -> Self {
        Self {
            catalog,
            fetcher,
            writer,
        }
    }

    /// Run the harvest over the plan's dates and persist all non-empty series
    pub async fn run(&self, plan: &HarvestPlan) -> RunReport {
        self.run_with_progress(plan, |_| {}).await
    }

    /// Like [`run`](Self::run), invoking `on_day_complete` after each
    /// processing day's fetch results have been folded in
    pub async fn run_with_progress(
        &self,
        plan: &HarvestPlan,
        mut on_day_complete: impl FnMut(NaiveDate),
    ) -> RunReport {
        let markets = self.catalog.fetch_active_markets().await;
        info!(
            markets = markets.len(),
            days = plan.dates().len(),
            "starting harvest run"
        );

        let mut series: BTreeMap<String, FundingSeries> = BTreeMap::new();
        for &date in plan.dates() {
            let day_results = self.fetcher.fetch_day(date, &markets).await;
            accumulate(&mut series, date, day_results, plan.date_filter());
            on_day_complete(date);
        }

        let mut report = RunReport {
            markets_discovered: markets.len(),
            days_processed: plan.dates().len(),
            ..Default::default()
        };

        for (ticker, market_series) in &series {
            if market_series.is_empty() {
                continue;
            }

            match self.writer.persist(ticker, market_series) {
                Ok(lines) => {
                    info!(ticker = %ticker, lines, "archive updated");
                    crate::metrics::record_archive_written(lines as u64);
                    report.markets_written += 1;
                    report.lines_written += lines;
                    report.outcomes.push(MarketOutcome::Written {
                        ticker: ticker.clone(),
                        lines,
                    });
                }
                Err(e) => {
                    error!(ticker = %ticker, error = %e, "failed to persist archive");
                    crate::metrics::record_persist_failure();
                    report.markets_failed += 1;
                    report.outcomes.push(MarketOutcome::Failed {
                        ticker: ticker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            written = report.markets_written,
            failed = report.markets_failed,
            lines = report.lines_written,
            "harvest run complete"
        );
        report
    }
}
