// crates/tally-reputation/src/lib.rs
//
// tally-reputation: Rating graph, column-stochastic normalization, and
// EigenTrust-style power iteration.
//
// Peers rate each other; the graph averages those ratings into a sparse
// matrix, normalizes each column, and iterates the trust vector to a fixed
// point. Everything here is single-threaded and deterministic.

pub mod config;
pub mod error;
pub mod peer;
pub mod trust_graph;

pub use config::ConvergenceConfig;
pub use error::ReputationError;
pub use peer::Peer;
pub use trust_graph::{ConvergenceOutcome, IndexedRatings, TrustGraph, TrustVector};
