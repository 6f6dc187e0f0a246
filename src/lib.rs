//! # Funding Rate Archiver Library
//!
//! A library for harvesting historical funding rates of perpetual-futures
//! markets from a dYdX-style indexer and maintaining a per-market CSV archive
//! on disk. Designed for incremental, re-runnable collection: every run merges
//! freshly fetched observations with whatever is already archived, without
//! data loss or duplication.
//!
//! ## Features
//!
//! - **Market Discovery**: Fetches the perpetual market list and filters to
//!   active, well-formed tickers
//! - **Rate Limiting**: A shared request budget bounds all outbound calls
//! - **Parallel Fetching**: Bounded fan-out over markets with per-market
//!   failure isolation
//! - **Idempotent Merge**: Newly fetched values win ties against archived
//!   values; archived values fill gaps
//! - **Crash-Safe Persistence**: Archive files are replaced atomically and are
//!   never observed partially written
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use funding_rate_archiver::fetcher::{http::IndexerHttpClient, MarketCatalog, FundingFetcher};
//! use funding_rate_archiver::harvester::{HarvestPlan, HarvestRunner, RateLimiter};
//! use funding_rate_archiver::output::ArchiveWriter;
//! use chrono::NaiveDate;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(25, std::time::Duration::from_secs(10));
//! let api = Arc::new(IndexerHttpClient::new("https://indexer.dydx.trade/v4", limiter));
//! let runner = HarvestRunner::new(
//!     MarketCatalog::new(api.clone()),
//!     FundingFetcher::new(api, 8),
//!     ArchiveWriter::new("./data", None),
//! );
//! let plan = HarvestPlan::single_day(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
//! let report = runner.run(&plan).await;
//! println!("{} markets written", report.markets_written);
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Indexer transport, market catalog, and per-day funding fetch
//! - [`harvester`] - Rate limiting, series accumulation, and run orchestration
//! - [`output`] - Archive path layout and merge-and-persist writer
//! - [`metrics`] - Observability counters with an optional Prometheus endpoint

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Indexer transport and fetch pipeline
pub mod fetcher;

/// Rate limiting, accumulation, and run orchestration
pub mod harvester;

/// Observability metrics
pub mod metrics;

/// Archive output writers
pub mod output;

/// Authoritative in-memory state for one market: funding rate per
/// second-truncated timestamp. Keys are unique and iterate in ascending
/// timestamp order.
pub type FundingSeries = BTreeMap<DateTime<Utc>, Decimal>;

/// Lifecycle status of a perpetual market as reported by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Market is open for trading
    #[serde(rename = "ACTIVE")]
    Active,
    /// Market is paused
    #[serde(rename = "PAUSED")]
    Paused,
    /// Only order cancellations are accepted
    #[serde(rename = "CANCEL_ONLY")]
    CancelOnly,
    /// Only post-only orders are accepted
    #[serde(rename = "POST_ONLY")]
    PostOnly,
    /// Market is being initialized and is not yet tradable
    #[serde(rename = "INITIALIZING")]
    Initializing,
    /// Market is in final settlement
    #[serde(rename = "FINAL_SETTLEMENT")]
    FinalSettlement,
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketStatus::Active => "ACTIVE",
            MarketStatus::Paused => "PAUSED",
            MarketStatus::CancelOnly => "CANCEL_ONLY",
            MarketStatus::PostOnly => "POST_ONLY",
            MarketStatus::Initializing => "INITIALIZING",
            MarketStatus::FinalSettlement => "FINAL_SETTLEMENT",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(MarketStatus::Active),
            "PAUSED" => Ok(MarketStatus::Paused),
            "CANCEL_ONLY" => Ok(MarketStatus::CancelOnly),
            "POST_ONLY" => Ok(MarketStatus::PostOnly),
            "INITIALIZING" => Ok(MarketStatus::Initializing),
            "FINAL_SETTLEMENT" => Ok(MarketStatus::FinalSettlement),
            _ => Err(format!("Invalid market status: {s}")),
        }
    }
}

/// Perpetual market metadata from the indexer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerpetualMarket {
    /// Market ticker (e.g., "BTC-USD")
    pub ticker: String,
    /// Current trading status
    pub status: MarketStatus,
}

impl PerpetualMarket {
    /// Validate market metadata integrity
    ///
    /// Tickers containing a comma are rejected: some listed composite
    /// instruments embed commas, and they cannot be disambiguated against the
    /// comma-delimited archive format.
    pub fn validate(&self) -> Result<(), String> {
        if self.ticker.is_empty() {
            return Err("Ticker cannot be empty".to_string());
        }

        if self.ticker.contains(',') {
            return Err(format!("Ticker must not contain a comma: {}", self.ticker));
        }

        Ok(())
    }
}

/// A single funding observation for one market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundingObservation {
    /// Market ticker (e.g., "BTC-USD")
    pub ticker: String,
    /// Time the rate became effective
    pub effective_at: DateTime<Utc>,
    /// Funding rate value (as decimal)
    pub rate: Decimal,
}

impl FundingObservation {
    /// Validate observation data integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.ticker.is_empty() {
            return Err("Ticker cannot be empty".to_string());
        }

        if self.effective_at.timestamp() <= 0 {
            return Err(format!(
                "Effective time must be after the Unix epoch, got {}",
                self.effective_at
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_market_status_from_str() {
        assert_eq!(
            MarketStatus::from_str("ACTIVE").unwrap(),
            MarketStatus::Active
        );
        assert_eq!(
            MarketStatus::from_str("PAUSED").unwrap(),
            MarketStatus::Paused
        );
        assert_eq!(
            MarketStatus::from_str("CANCEL_ONLY").unwrap(),
            MarketStatus::CancelOnly
        );
        assert_eq!(
            MarketStatus::from_str("POST_ONLY").unwrap(),
            MarketStatus::PostOnly
        );
        assert_eq!(
            MarketStatus::from_str("INITIALIZING").unwrap(),
            MarketStatus::Initializing
        );
        assert_eq!(
            MarketStatus::from_str("FINAL_SETTLEMENT").unwrap(),
            MarketStatus::FinalSettlement
        );
    }

    #[test]
    fn test_market_status_from_str_invalid() {
        assert!(MarketStatus::from_str("OPEN").is_err());
        assert!(MarketStatus::from_str("active").is_err());
        assert!(MarketStatus::from_str("").is_err());
    }

    #[test]
    fn test_market_status_round_trip() {
        let statuses = vec![
            MarketStatus::Active,
            MarketStatus::Paused,
            MarketStatus::CancelOnly,
            MarketStatus::PostOnly,
            MarketStatus::Initializing,
            MarketStatus::FinalSettlement,
        ];

        for status in statuses {
            let string = status.to_string();
            let parsed = MarketStatus::from_str(&string).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_market_validate() {
        let mut market = PerpetualMarket {
            ticker: "BTC-USD".to_string(),
            status: MarketStatus::Active,
        };
        assert!(market.validate().is_ok());

        market.ticker = String::new();
        assert!(market.validate().is_err());

        market.ticker = "A,B-USD".to_string();
        assert!(market.validate().is_err());
    }

    #[test]
    fn test_observation_validate() {
        let mut obs = FundingObservation {
            ticker: "BTC-USD".to_string(),
            effective_at: Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap(),
            rate: Decimal::from_str("0.0000125").unwrap(),
        };
        assert!(obs.validate().is_ok());

        obs.ticker = String::new();
        assert!(obs.validate().is_err());
        obs.ticker = "BTC-USD".to_string();

        obs.effective_at = Utc.timestamp_opt(0, 0).unwrap();
        assert!(obs.validate().is_err());
    }
}
