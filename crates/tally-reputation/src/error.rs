use thiserror::Error;

/// Errors raised while building or configuring a trust graph.
#[derive(Debug, Error, PartialEq)]
pub enum ReputationError {
    /// A rating referenced a peer index outside the graph.
    #[error("Peer index {index} out of range for {peer_count} peers")]
    PeerIndexOutOfRange { index: usize, peer_count: usize },

    /// A supplied trust vector has the wrong shape or invalid values.
    #[error("Invalid trust vector: {0}")]
    InvalidTrustVector(String),

    /// Convergence settings cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
