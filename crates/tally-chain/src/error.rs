// crates/tally-chain/src/error.rs
//
// Error and rejection types for mining and ledger operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tally_core::Hash256;

/// Why a candidate entry was refused by the ledger.
///
/// Every rejection is recoverable: the ledger is left untouched and the
/// caller may retry with a freshly built candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Rejection {
    /// The candidate's index is not the next ledger position.
    #[error("Entry index {found} is out of sequence (expected {expected})")]
    IndexOutOfSequence {
        /// The next free ledger position.
        expected: u64,
        /// Index carried by the candidate.
        found: u64,
    },

    /// `previous_hash` does not match the predecessor's hash.
    #[error("Previous hash {found} does not match predecessor {expected}")]
    LinkageMismatch {
        /// Hash of the predecessor entry.
        expected: Hash256,
        /// Hash carried by the candidate.
        found: Hash256,
    },

    /// The hash does not carry enough leading zero nibbles.
    #[error("Hash {hash} does not meet difficulty {difficulty}")]
    PuzzleUnsatisfied {
        /// Required leading zero nibbles.
        difficulty: u32,
        /// Stored hash of the candidate.
        hash: Hash256,
    },

    /// The stored hash is not the digest of the entry's fields.
    #[error("Stored hash {stored} does not match recomputed hash {computed}")]
    HashIntegrityFailure {
        /// Hash carried by the candidate.
        stored: Hash256,
        /// Hash recomputed from the candidate's fields.
        computed: Hash256,
    },
}

/// The first entry at which a full-chain audit failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Chain audit failed at entry {position}: {reason}")]
pub struct AuditFailure {
    /// Position in the ledger of the offending entry.
    pub position: u64,
    /// Which invariant it broke.
    pub reason: Rejection,
}

/// Errors from constructing or driving the miner.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Mining configuration cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A blocking mining task panicked or was cancelled.
    #[error("Mining worker failed: {0}")]
    Worker(String),
}
