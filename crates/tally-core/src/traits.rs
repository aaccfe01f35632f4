// crates/tally-core/src/traits.rs

use async_trait::async_trait;

use crate::error::TallyError;
use crate::snapshot::RatingSnapshot;

/// Narrow capability exposed by a rating peer.
///
/// Implemented by `tally_reputation::peer::Peer`.
pub trait RatingSource {
    /// Stable identifier of the peer.
    fn identifier(&self) -> &str;

    /// An owned copy of the ratings this peer has given. Callers never hold a
    /// live reference into the peer's state.
    fn get_ratings(&self) -> RatingSnapshot;
}

/// Identity/signature collaborator. The engine trusts the boolean.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Key-value blob storage for peer data kept outside the ledger.
///
/// Implemented by tally-store. Only plain mapping semantics are assumed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `value` under `key`, overwriting any previous value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), TallyError>;

    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TallyError>;
}
