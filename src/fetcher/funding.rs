//! Per-day funding history fetch fan-out

use crate::fetcher::IndexerApi;
use crate::harvester::config::FUNDING_FETCH_LIMIT;
use crate::FundingObservation;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::{stream, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches one day's funding observations for many markets concurrently
pub struct FundingFetcher {
    api: Arc<dyn IndexerApi>,
    concurrency: usize,
}

impl FundingFetcher {
    /// Create a fetcher with the given fan-out width
    ///
    /// The rate limiter inside the transport bounds request rate; `concurrency`
    /// only bounds how many fetches are in flight at once.
    pub fn new(api: Arc<dyn IndexerApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch the last-24h funding observations for every market on `date`
    ///
    /// The request window is the half-open UTC day `[date, date+1)`: each
    /// market is asked for entries effective at or before the window end.
    /// Markets whose fetch fails are logged and absent from the result; one
    /// failing market never affects the others. All of the day's fetches have
    /// completed by the time this returns.
    pub async fn fetch_day(
        &self,
        date: NaiveDate,
        markets: &BTreeSet<String>,
    ) -> HashMap<String, Vec<FundingObservation>> {
        let window_end = day_window_end(date);

        let mut fetches = stream::iter(markets.iter().cloned())
            .map(|ticker| {
                let api = Arc::clone(&self.api);
                async move {
                    let result = api
                        .historical_funding(&ticker, window_end, FUNDING_FETCH_LIMIT)
                        .await;
                    (ticker, result)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut results = HashMap::new();
        while let Some((ticker, result)) = fetches.next().await {
            match result {
                Ok(observations) => {
                    debug!(
                        ticker = %ticker,
                        day = %date,
                        count = observations.len(),
                        "fetched funding history"
                    );
                    results.insert(ticker, observations);
                }
                Err(e) => {
                    warn!(
                        ticker = %ticker,
                        day = %date,
                        error = %e,
                        "funding fetch failed, market skipped for this day"
                    );
                    crate::metrics::record_market_fetch_failure();
                }
            }
        }

        results
    }
}

/// End of the half-open UTC day window `[date, date+1)`
fn day_window_end(date: NaiveDate) -> DateTime<Utc> {
    let next = date.succ_opt().expect("date range stays in bounds");
    next.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}
