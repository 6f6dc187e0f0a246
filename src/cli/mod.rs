//! CLI command implementations

pub mod error;
pub mod harvest;
pub mod markets;

pub use error::CliError;
pub use harvest::{Cli, Commands, HarvestArgs};
pub use markets::MarketsCommand;
