//! Indexer HTTP client
//!
//! Provides the production [`IndexerApi`] implementation with:
//! - Generic request/response handling
//! - Rate limit integration (every attempt passes the shared gate)
//! - Retry logic with exponential backoff

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::fetcher::{FetcherError, FetcherResult, IndexerApi};
use crate::harvester::config::{calculate_backoff, MAX_RETRIES};
use crate::harvester::RateLimiter;
use crate::{FundingObservation, MarketStatus, PerpetualMarket};

/// HTTP client for all indexer interactions
pub struct IndexerHttpClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl IndexerHttpClient {
    /// Create a new HTTP client
    ///
    /// # Arguments
    /// * `base_url` - Base URL for API endpoints (e.g., "<https://indexer.dydx.trade/v4>")
    /// * `rate_limiter` - Shared rate limiter gating every request attempt
    pub fn new(base_url: impl Into<String>, rate_limiter: RateLimiter) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            client: Client::new(),
            base_url,
            rate_limiter,
        }
    }

    /// Execute a GET request with generic deserialization
    ///
    /// # Arguments
    /// * `endpoint` - API endpoint path (e.g., "/perpetualMarkets")
    /// * `params` - Query parameters as key-value pairs
    ///
    /// # Errors
    /// Returns [`FetcherError`] on network, parse, or API errors
    async fn get<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} with {} params", url, params.len());
        self.request_with_retry(&url, params).await
    }

    /// Retry loop with exponential backoff
    ///
    /// Retries on network errors, 5xx server errors, and 429 rate limit
    /// responses. Client errors other than 429 are returned immediately.
    /// Every attempt, including retries, first acquires a rate-limiter slot.
    async fn request_with_retry<T>(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                crate::metrics::record_retry();
            }
            self.rate_limiter.acquire().await;
            crate::metrics::record_request();

            let response = match self.client.get(url).query(params).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        "Network error on attempt {}/{}: {}",
                        attempt + 1,
                        MAX_RETRIES + 1,
                        e
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));

                    if attempt < MAX_RETRIES {
                        let backoff = calculate_backoff(attempt);
                        debug!("Retrying after {:?}", backoff);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                warn!(
                    "Rate limit response (429) on attempt {}/{}",
                    attempt + 1,
                    MAX_RETRIES + 1
                );
                last_error = Some(FetcherError::RateLimitExceeded);

                if attempt < MAX_RETRIES {
                    let backoff = calculate_backoff(attempt);
                    debug!("Retrying after {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            if status.is_server_error() {
                warn!(
                    "Server error {} on attempt {}/{}",
                    status,
                    attempt + 1,
                    MAX_RETRIES + 1
                );
                last_error = Some(FetcherError::HttpError(format!("Server error: {status}")));

                if attempt < MAX_RETRIES {
                    let backoff = calculate_backoff(attempt);
                    debug!("Retrying after {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            if status.is_client_error() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(FetcherError::HttpError(format!(
                    "Client error {status}: {error_text}"
                )));
            }

            return match response.json::<T>().await {
                Ok(data) => {
                    debug!("Request succeeded on attempt {}", attempt + 1);
                    Ok(data)
                }
                Err(e) => Err(FetcherError::ParseError(format!(
                    "Failed to deserialize response: {e}"
                ))),
            };
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("All retries exhausted".to_string())))
    }
}

#[async_trait]
impl IndexerApi for IndexerHttpClient {
    async fn perpetual_markets(&self) -> FetcherResult<HashMap<String, PerpetualMarket>> {
        let response: PerpetualMarketsResponse = self.get("/perpetualMarkets", &[]).await?;

        Ok(response
            .markets
            .into_iter()
            .map(|(key, market)| {
                (
                    key,
                    PerpetualMarket {
                        ticker: market.ticker,
                        status: market.status,
                    },
                )
            })
            .collect())
    }

    async fn historical_funding(
        &self,
        ticker: &str,
        effective_before_or_at: DateTime<Utc>,
        limit: usize,
    ) -> FetcherResult<Vec<FundingObservation>> {
        let endpoint = format!("/historicalFunding/{ticker}");
        let params = [
            ("limit", limit.to_string()),
            (
                "effectiveBeforeOrAt",
                effective_before_or_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];

        let response: HistoricalFundingResponse = self.get(&endpoint, &params).await?;

        Ok(response
            .historical_funding
            .into_iter()
            .map(|entry| FundingObservation {
                ticker: entry.ticker,
                effective_at: entry.effective_at,
                rate: entry.rate,
            })
            .collect())
    }
}

/// Payload of `GET /perpetualMarkets`
#[derive(Debug, Deserialize)]
struct PerpetualMarketsResponse {
    markets: HashMap<String, PerpetualMarketPayload>,
}

#[derive(Debug, Deserialize)]
struct PerpetualMarketPayload {
    ticker: String,
    status: MarketStatus,
}

/// Payload of `GET /historicalFunding/<ticker>`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalFundingResponse {
    historical_funding: Vec<HistoricalFundingPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalFundingPayload {
    ticker: String,
    rate: Decimal,
    effective_at: DateTime<Utc>,
}
