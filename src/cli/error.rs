//! CLI error types

/// CLI errors
///
/// Fetch and persistence failures are absorbed inside the run (see the
/// harvester's failure policy), so command execution only fails on argument
/// problems.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
