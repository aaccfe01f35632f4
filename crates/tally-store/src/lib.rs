// crates/tally-store/src/lib.rs
//
// tally-store: Blob storage for peer data kept outside the ledger.
//
// The engine only needs put/get mapping semantics. The in-memory store is
// what the node wires up by default; anything implementing `BlobStore` can
// replace it.

pub mod memory;

pub use memory::InMemoryBlobStore;
