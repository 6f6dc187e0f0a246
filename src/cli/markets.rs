//! Market listing command

use crate::cli::harvest::{build_indexer, Cli};
use crate::cli::CliError;
use crate::fetcher::MarketCatalog;
use clap::Args;

/// Arguments for the markets command
#[derive(Args, Debug)]
pub struct MarketsCommand {}

impl MarketsCommand {
    /// Execute the markets command: print the active market set
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let catalog = MarketCatalog::new(build_indexer(cli));
        let markets = catalog.fetch_active_markets().await;

        if markets.is_empty() {
            println!("no active markets (catalog unavailable or empty)");
            return Ok(());
        }

        for ticker in &markets {
            println!("{ticker}");
        }
        println!("{} active markets", markets.len());
        Ok(())
    }
}
