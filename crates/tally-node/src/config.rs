// crates/tally-node/src/config.rs
//
// Runtime configuration for a Tally node.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tally_chain::PowConfig;
use tally_reputation::ConvergenceConfig;

use crate::error::NodeError;

/// Runtime configuration for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Leading zero hex characters required of every appended entry.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,

    /// Entries mined concurrently per batch.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Power-iteration cap for trust convergence.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// L1 convergence threshold for trust convergence.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Only peers verified by the registry get ledger entries.
    #[serde(default)]
    pub require_verified: bool,
}

fn default_difficulty() -> u32 {
    2
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_max_iterations() -> u32 {
    40
}

fn default_epsilon() -> f64 {
    1e-8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            worker_count: default_worker_count(),
            max_iterations: default_max_iterations(),
            epsilon: default_epsilon(),
            log_level: default_log_level(),
            require_verified: false,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            NodeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, NodeError> {
        toml::from_str(contents).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn pow_config(&self) -> PowConfig {
        PowConfig::new(self.difficulty, self.worker_count)
    }

    pub fn convergence_config(&self) -> ConvergenceConfig {
        ConvergenceConfig {
            max_iterations: self.max_iterations,
            epsilon: self.epsilon,
        }
    }
}
