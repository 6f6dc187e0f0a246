//! Folds per-day fetch results into per-market series

use crate::{FundingObservation, FundingSeries};
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Fold one day's fetch results into the per-market series map
///
/// A series is created for every ticker present in `fetched`, even when all
/// of its observations end up filtered out. Timestamps are truncated to whole
/// seconds before insertion; within a single call the last write wins for a
/// given second, since no ordering is assumed from the upstream list. When
/// `date_filter` is set, observations whose UTC calendar date does not match
/// are skipped.
///
/// # Arguments
/// * `series` - Per-market series accumulated so far, mutated in place
/// * `day` - Processing day, used for observability only
/// * `fetched` - Per-market observations returned by the day's fetch
/// * `date_filter` - Optional calendar-date filter (deployment-date mode)
pub fn accumulate(
    series: &mut BTreeMap<String, FundingSeries>,
    day: NaiveDate,
    fetched: HashMap<String, Vec<FundingObservation>>,
    date_filter: Option<NaiveDate>,
) {
    for (ticker, observations) in fetched {
        let market_series = series.entry(ticker.clone()).or_default();
        let mut retained = 0u64;

        for obs in observations {
            if let Some(filter) = date_filter {
                if obs.effective_at.date_naive() != filter {
                    continue;
                }
            }

            let truncated = obs
                .effective_at
                .with_nanosecond(0)
                .expect("zero nanoseconds is always in range");
            market_series.insert(truncated, obs.rate);
            retained += 1;
        }

        debug!(ticker = %ticker, day = %day, retained, "accumulated funding observations");
        crate::metrics::record_observations_retained(retained);
    }
}
