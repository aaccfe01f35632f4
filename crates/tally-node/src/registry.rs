// crates/tally-node/src/registry.rs
//
// PeerRegistry: records known peers and whether their identity checked out.
//
// Registration asks the signature collaborator to verify a signed message.
// Peers that fail are still recorded, as non-verified. A failed attempt never
// replaces an already verified record. A successful one always does, including
// its public key, so a peer can rotate keys by re-registering.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tally_core::SignatureVerifier;

/// What the registry knows about a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub identifier: String,
    /// Public key presented at registration.
    pub public_key: Vec<u8>,
    /// Whether the registration signature verified.
    pub verified: bool,
}

/// Registry of peers keyed by identifier.
#[derive(Clone)]
pub struct PeerRegistry {
    verifier: Arc<dyn SignatureVerifier>,
    peers: HashMap<String, PeerRecord>,
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("peers", &self.peers)
            .finish_non_exhaustive()
    }
}

impl PeerRegistry {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            verifier,
            peers: HashMap::new(),
        }
    }

    /// Register a peer, verifying `signature` over `message` with `public_key`.
    ///
    /// Returns whether the peer is verified after the call. A verified
    /// registration replaces any existing record for `identifier`, key included.
    pub fn register_peer(
        &mut self,
        identifier: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> bool {
        let verified = self.verifier.verify(message, signature, public_key);

        if !verified {
            if let Some(existing) = self.peers.get(identifier) {
                if existing.verified {
                    tracing::warn!(
                        "Peer {} failed re-verification; keeping existing verified record",
                        identifier
                    );
                    return true;
                }
            }
            tracing::warn!("Peer {} failed verification; registered as non-verified", identifier);
        } else {
            if let Some(existing) = self.peers.get(identifier) {
                if existing.public_key != public_key {
                    tracing::warn!("Peer {} re-registered with a different public key", identifier);
                }
            }
            tracing::info!("Peer {} verified and registered", identifier);
        }

        self.peers.insert(
            identifier.to_string(),
            PeerRecord {
                identifier: identifier.to_string(),
                public_key: public_key.to_vec(),
                verified,
            },
        );
        verified
    }

    pub fn is_verified(&self, identifier: &str) -> bool {
        self.peers.get(identifier).map_or(false, |p| p.verified)
    }

    pub fn get(&self, identifier: &str) -> Option<&PeerRecord> {
        self.peers.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn verified_count(&self) -> usize {
        self.peers.values().filter(|p| p.verified).count()
    }
}
