//! Active-market discovery

use crate::fetcher::IndexerApi;
use crate::MarketStatus;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Discovers the set of markets worth fetching funding history for
pub struct MarketCatalog {
    api: Arc<dyn IndexerApi>,
}

impl MarketCatalog {
    /// Create a catalog backed by `api`
    pub fn new(api: Arc<dyn IndexerApi>) -> Self {
        Self { api }
    }

    /// Fetch the market list and return the active, well-formed tickers
    ///
    /// Markets that are not `ACTIVE` are dropped, as are tickers containing a
    /// comma (composite instruments the archive format cannot represent). A
    /// transport or parse failure yields an empty set: the run proceeds and
    /// simply fetches nothing.
    pub async fn fetch_active_markets(&self) -> BTreeSet<String> {
        let markets = match self.api.perpetual_markets().await {
            Ok(markets) => markets,
            Err(e) => {
                warn!(error = %e, "market catalog fetch failed, continuing with empty set");
                crate::metrics::record_catalog_failure();
                return BTreeSet::new();
            }
        };

        let active: BTreeSet<String> = markets
            .into_values()
            .filter(|market| market.status == MarketStatus::Active)
            .filter_map(|market| match market.validate() {
                Ok(()) => Some(market.ticker),
                Err(reason) => {
                    warn!(ticker = %market.ticker, reason = %reason, "excluding malformed market");
                    None
                }
            })
            .collect();

        debug!(count = active.len(), "discovered active markets");
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetcherError, FetcherResult};
    use crate::{FundingObservation, PerpetualMarket};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;

    struct FakeIndexer {
        markets: FetcherResult<HashMap<String, PerpetualMarket>>,
    }

    #[async_trait]
    impl IndexerApi for FakeIndexer {
        async fn perpetual_markets(&self) -> FetcherResult<HashMap<String, PerpetualMarket>> {
            match &self.markets {
                Ok(markets) => Ok(markets.clone()),
                Err(_) => Err(FetcherError::NetworkError("connection refused".to_string())),
            }
        }

        async fn historical_funding(
            &self,
            _ticker: &str,
            _effective_before_or_at: DateTime<Utc>,
            _limit: usize,
        ) -> FetcherResult<Vec<FundingObservation>> {
            Ok(Vec::new())
        }
    }

    fn market(ticker: &str, status: MarketStatus) -> (String, PerpetualMarket) {
        (
            ticker.to_string(),
            PerpetualMarket {
                ticker: ticker.to_string(),
                status,
            },
        )
    }

    #[tokio::test]
    async fn test_filters_to_active_markets() {
        let api = Arc::new(FakeIndexer {
            markets: Ok(HashMap::from([
                market("BTC-USD", MarketStatus::Active),
                market("ETH-USD", MarketStatus::Active),
                market("OLD-USD", MarketStatus::FinalSettlement),
                market("HALT-USD", MarketStatus::Paused),
            ])),
        });

        let catalog = MarketCatalog::new(api);
        let active = catalog.fetch_active_markets().await;

        assert_eq!(
            active,
            BTreeSet::from(["BTC-USD".to_string(), "ETH-USD".to_string()])
        );
    }

    #[tokio::test]
    async fn test_excludes_comma_tickers_regardless_of_status() {
        let api = Arc::new(FakeIndexer {
            markets: Ok(HashMap::from([
                market("BTC-USD", MarketStatus::Active),
                market("A,B-USD", MarketStatus::Active),
            ])),
        });

        let catalog = MarketCatalog::new(api);
        let active = catalog.fetch_active_markets().await;

        assert_eq!(active, BTreeSet::from(["BTC-USD".to_string()]));
    }

    #[tokio::test]
    async fn test_catalog_failure_yields_empty_set() {
        let api = Arc::new(FakeIndexer {
            markets: Err(FetcherError::NetworkError("unused".to_string())),
        });

        let catalog = MarketCatalog::new(api);
        let active = catalog.fetch_active_markets().await;

        assert!(active.is_empty());
    }
}
