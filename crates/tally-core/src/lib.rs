// crates/tally-core/src/lib.rs
//
// tally-core: Core types, canonical hash codec, and collaborator traits for
// the Tally reputation ledger.
//
// This is the leaf crate that every other crate in the workspace depends on.
// It defines the ledger entry, the rating snapshot carried as entry payload,
// the canonical byte encoding that entry hashes are computed over, and the
// narrow interfaces through which the engine talks to peers, identity
// verification and blob storage.

pub mod codec;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod hash;
pub mod snapshot;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use tally_core::Entry;`

pub use entry::Entry;
pub use error::TallyError;
pub use hash::Hash256;
pub use snapshot::RatingSnapshot;
pub use traits::{BlobStore, RatingSource, SignatureVerifier};
