// crates/tally-node/src/lib.rs
//
// tally-node: Configuration, peer registry, and round orchestration for the
// Tally reputation ledger.
//
// A round takes every peer's rating snapshot, converges global trust over the
// rating graph, packages (ratings, trust) per peer into candidate entries,
// mines them, and appends them to the ledger in peer order.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod node;
pub mod registry;
pub mod telemetry;

pub use config::NodeConfig;
pub use error::NodeError;
pub use ingestion::{ReputationIngestion, RoundReport};
pub use node::Node;
pub use registry::{PeerRecord, PeerRegistry};
pub use telemetry::init_tracing;
