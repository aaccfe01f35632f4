// crates/tally-node/src/error.rs

use thiserror::Error;

use tally_chain::ChainError;
use tally_core::TallyError;
use tally_reputation::ReputationError;

/// Errors surfaced by node configuration and round orchestration.
///
/// Ledger rejections are not errors here; they are collected in the
/// `RoundReport`.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Reputation(#[from] ReputationError),

    #[error(transparent)]
    Core(#[from] TallyError),
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::Core(TallyError::from(e))
    }
}
