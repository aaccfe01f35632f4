// crates/tally-core/src/entry.rs
//
// Ledger entry (block): one hash-linked, puzzle-sealed reputation record.
//
// `hash` is computed at construction and must be recomputed on every change
// to a hashed field. `set_nonce` and `relink` do this; code that writes the
// public fields directly is responsible for calling `refresh_hash`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::hash::Hash256;
use crate::snapshot::RatingSnapshot;

/// A ledger entry carrying one peer's ratings and its converged trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Position in the ledger (0 for genesis).
    pub index: u64,
    /// Hash of the entry at `index - 1` (all zeros for genesis).
    pub previous_hash: Hash256,
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: f64,
    /// Ratings submitted by the peer this entry describes.
    pub payload: RatingSnapshot,
    /// The peer's global trust score at the time the entry was built.
    pub trust_score: f64,
    /// Proof-of-work counter.
    pub nonce: u64,
    /// Digest of the canonical encoding of all the fields above.
    pub hash: Hash256,
}

impl Entry {
    /// Build an unmined entry (`nonce = 0`) with its hash computed.
    pub fn new(
        index: u64,
        previous_hash: Hash256,
        timestamp: f64,
        payload: RatingSnapshot,
        trust_score: f64,
    ) -> Self {
        let mut entry = Self {
            index,
            previous_hash,
            timestamp,
            payload,
            trust_score,
            nonce: 0,
            hash: Hash256::ZERO,
        };
        entry.refresh_hash();
        entry
    }

    /// The fixed genesis sentinel: index 0, zero linkage, empty payload,
    /// zero timestamp and zero trust.
    pub fn genesis() -> Self {
        Self::new(0, Hash256::ZERO, 0.0, RatingSnapshot::new(), 0.0)
    }

    /// Recompute the digest from the current field values.
    pub fn compute_hash(&self) -> Hash256 {
        codec::hash_fields(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.payload,
            self.trust_score,
            self.nonce,
        )
    }

    /// Canonical encoding of everything but the nonce.
    pub fn encode_prefix(&self) -> Vec<u8> {
        codec::encode_prefix(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.payload,
            self.trust_score,
        )
    }

    /// Store the recomputed digest in `hash`.
    pub fn refresh_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Whether the stored hash matches the recomputed one.
    pub fn is_hash_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Set the nonce and recompute the hash.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.refresh_hash();
    }

    /// Point the entry at a new predecessor and recompute the hash.
    pub fn relink(&mut self, previous_hash: Hash256) {
        self.previous_hash = previous_hash;
        self.refresh_hash();
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry {} (trust={:.4}, peers rated={}, nonce={}, hash={}, previous={})",
            self.index,
            self.trust_score,
            self.payload.len(),
            self.nonce,
            self.hash,
            self.previous_hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> RatingSnapshot {
        let mut snap = RatingSnapshot::new();
        snap.record("peer-2", 6.0);
        snap.record("peer-3", 9.0);
        snap
    }

    #[test]
    fn new_entry_has_consistent_hash() {
        let entry = Entry::new(1, Hash256([3u8; 32]), 100.0, sample_payload(), 0.4);
        assert_eq!(entry.nonce, 0);
        assert!(entry.is_hash_consistent());
    }

    #[test]
    fn set_nonce_recomputes_hash() {
        let mut entry = Entry::new(1, Hash256::ZERO, 100.0, sample_payload(), 0.4);
        let before = entry.hash;
        entry.set_nonce(1);
        assert_ne!(entry.hash, before);
        assert!(entry.is_hash_consistent());
    }

    #[test]
    fn direct_field_write_is_detected() {
        let mut entry = Entry::new(1, Hash256::ZERO, 100.0, sample_payload(), 0.4);
        entry.trust_score = 0.9;
        assert!(!entry.is_hash_consistent());
        entry.refresh_hash();
        assert!(entry.is_hash_consistent());
    }

    #[test]
    fn genesis_is_a_fixed_sentinel() {
        let a = Entry::genesis();
        let b = Entry::genesis();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.previous_hash, Hash256::ZERO);
        assert_eq!(a.trust_score, 0.0);
        assert!(a.payload.is_empty());
        assert!(a.is_genesis());
    }

    #[test]
    fn relink_changes_hash() {
        let mut entry = Entry::new(2, Hash256::ZERO, 5.0, sample_payload(), 0.1);
        let before = entry.hash;
        entry.relink(Hash256([9u8; 32]));
        assert_eq!(entry.previous_hash, Hash256([9u8; 32]));
        assert_ne!(entry.hash, before);
    }
}
