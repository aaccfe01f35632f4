// crates/tally-chain/src/config.rs
//
// Mining configuration, passed explicitly into `ProofOfWork`.

use serde::{Deserialize, Serialize};

use tally_core::hash::MAX_NIBBLES;

use crate::error::ChainError;

/// Configuration for proof-of-work mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowConfig {
    /// Required leading zero hex characters in an admitted entry's hash. Default: 2.
    pub difficulty: u32,
    /// Maximum candidates mined concurrently per batch. Default: 4.
    pub worker_count: usize,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            worker_count: 4,
        }
    }
}

impl PowConfig {
    pub fn new(difficulty: u32, worker_count: usize) -> Self {
        Self {
            difficulty,
            worker_count,
        }
    }

    /// Reject settings under which mining could never terminate or never run.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.difficulty > MAX_NIBBLES {
            return Err(ChainError::InvalidConfig(format!(
                "difficulty {} exceeds the {} nibbles of a 256-bit hash",
                self.difficulty, MAX_NIBBLES
            )));
        }
        if self.worker_count == 0 {
            return Err(ChainError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
