// crates/tally-chain/src/lib.rs
//
// tally-chain: Proof-of-work mining and the append-only, hash-linked ledger.
//
// Mining is the only concurrent part of the engine: candidates are mined on
// blocking worker threads in fixed-size batches and handed back in the order
// they were submitted. Appending to the ledger is single-writer.

pub mod config;
pub mod error;
pub mod ledger;
pub mod pow;

pub use config::PowConfig;
pub use error::{AuditFailure, ChainError, Rejection};
pub use ledger::Ledger;
pub use pow::ProofOfWork;
