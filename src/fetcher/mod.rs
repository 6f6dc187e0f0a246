//! Indexer transport and fetch pipeline

use crate::{FundingObservation, PerpetualMarket};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub mod catalog;
pub mod funding;
pub mod http;

pub use catalog::MarketCatalog;
pub use funding::FundingFetcher;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Read-only view of the remote indexing service
///
/// Both operations may fail with a transport error or a deserialization
/// error; callers treat the two identically as "no data for this request."
#[async_trait]
pub trait IndexerApi: Send + Sync {
    /// Fetch the full perpetual market list, keyed by ticker
    async fn perpetual_markets(&self) -> FetcherResult<HashMap<String, PerpetualMarket>>;

    /// Fetch up to `limit` funding entries for `ticker` effective at or
    /// before `effective_before_or_at`
    async fn historical_funding(
        &self,
        ticker: &str,
        effective_before_or_at: DateTime<Utc>,
        limit: usize,
    ) -> FetcherResult<Vec<FundingObservation>>;
}
