//! Harvest configuration constants

use chrono::NaiveDate;
use std::time::Duration;

/// Maximum number of retries for failed indexer requests.
/// 5 retries with exponential backoff recovers from transient network issues
/// without looping on persistent failures (max total wait ~1 minute).
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
/// 1 second is long enough for a rate-limit window to drain but short enough
/// to not overly delay recovery from transient errors.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential backoff to prevent excessive wait times.
pub const MAX_BACKOFF_MS: u64 = 30000;

/// Default request budget per rate-limit window.
/// The reference deployment allows 25 requests per 10-second window.
pub const DEFAULT_MAX_REQUESTS: usize = 25;

/// Default rate-limit window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Default number of concurrent per-market fetches.
/// The rate limiter coordinates all in-flight requests, so this bounds task
/// fan-out rather than request rate.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Funding entries requested per market per day.
/// Funding settles hourly, so 24 entries cover one UTC day.
pub const FUNDING_FETCH_LIMIT: usize = 24;

/// Default indexer base URL.
pub const DEFAULT_BASE_URL: &str = "https://indexer.dydx.trade/v4";

/// First processing day of a full backfill when no start date is configured.
pub fn default_backfill_start() -> NaiveDate {
    // 2021-02-01 predates every listed perpetual market.
    NaiveDate::from_ymd_opt(2021, 2, 1).expect("constant date is valid")
}

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS * 2u64.pow(retry_count);
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
