// crates/tally-reputation/src/config.rs
//
// Power-iteration stopping rule.

use serde::{Deserialize, Serialize};

use crate::error::ReputationError;

/// Configuration for trust convergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Maximum power iterations. Default: 40.
    pub max_iterations: u32,
    /// Convergence threshold on the L1 distance between successive
    /// trust vectors. Default: 1e-8.
    pub epsilon: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            epsilon: 1e-8,
        }
    }
}

impl ConvergenceConfig {
    pub fn validate(&self) -> Result<(), ReputationError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ReputationError::InvalidConfig(format!(
                "epsilon must be a finite non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
