// crates/tally-chain/src/pow.rs
//
// Proof-of-work mining and validation.
//
// The puzzle: find a nonce such that the hex form of the entry hash starts
// with `difficulty` zeros. Only the nonce is searched; the timestamp is never
// touched, so a proof is reproducible from the entry's fields alone.
//
// Each candidate is mined from a SHA-256 state that has already absorbed the
// fixed part of the preimage, so a try costs one clone and one 8-byte update.

use sha2::{Digest, Sha256};

use tally_core::{Entry, Hash256};

use crate::config::PowConfig;
use crate::error::ChainError;

/// Search nonces upward from `entry.nonce` until the hash meets `difficulty`.
///
/// Never fails. Does not terminate for `difficulty > 64`; `ProofOfWork`
/// refuses such configurations. The nonce wraps at `u64::MAX`.
pub fn mine(mut entry: Entry, difficulty: u32) -> Entry {
    let mut base = Sha256::new();
    base.update(entry.encode_prefix());

    let mut nonce = entry.nonce;
    let mut attempts: u64 = 0;
    loop {
        let mut hasher = base.clone();
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        let hash = Hash256(out);
        attempts += 1;

        if hash.meets_difficulty(difficulty) {
            entry.nonce = nonce;
            entry.hash = hash;
            tracing::debug!(
                index = entry.index,
                nonce,
                attempts,
                hash = %entry.hash,
                "Entry mined"
            );
            return entry;
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Whether the entry's stored hash both meets `difficulty` and is the true
/// digest of its fields.
pub fn is_valid_pow(entry: &Entry, difficulty: u32) -> bool {
    entry.hash.meets_difficulty(difficulty) && entry.is_hash_consistent()
}

/// Mine `entries` in batches of at most `worker_count`, one blocking task per
/// entry. Each batch is joined before the next starts, and the result keeps
/// the submission order regardless of which worker finishes first.
pub async fn mine_parallel(
    entries: Vec<Entry>,
    difficulty: u32,
    worker_count: usize,
) -> Result<Vec<Entry>, ChainError> {
    let worker_count = worker_count.max(1);
    let total = entries.len();
    let mut mined = Vec::with_capacity(total);
    let mut pending = entries.into_iter().peekable();

    while pending.peek().is_some() {
        let handles: Vec<_> = pending
            .by_ref()
            .take(worker_count)
            .map(|entry| tokio::task::spawn_blocking(move || mine(entry, difficulty)))
            .collect();

        // Awaiting in spawn order is the join barrier and the reordering step.
        for handle in handles {
            let entry = handle
                .await
                .map_err(|e| ChainError::Worker(e.to_string()))?;
            mined.push(entry);
        }
        tracing::trace!("Mining batch joined ({}/{} entries)", mined.len(), total);
    }

    Ok(mined)
}

/// Chain `entries` onto `tip` in order and mine each one.
///
/// Entry k gets index `tip.index + 1 + k` and links to the hash of entry
/// k - 1 (the tip for k = 0). Entries already correctly linked and sealed keep
/// their nonce; the rest are relinked and mined starting from their current
/// nonce. The work runs on a single blocking task because each link depends
/// on the previous entry's final hash.
pub async fn seal_in_order(
    entries: Vec<Entry>,
    tip: &Entry,
    difficulty: u32,
) -> Result<Vec<Entry>, ChainError> {
    let tip_index = tip.index;
    let tip_hash = tip.hash;
    tokio::task::spawn_blocking(move || seal_onto(entries, tip_index, tip_hash, difficulty))
        .await
        .map_err(|e| ChainError::Worker(e.to_string()))
}

fn seal_onto(entries: Vec<Entry>, tip_index: u64, tip_hash: Hash256, difficulty: u32) -> Vec<Entry> {
    let mut previous = tip_hash;
    let mut index = tip_index + 1;
    let mut resealed = 0usize;
    let sealed: Vec<Entry> = entries
        .into_iter()
        .map(|mut entry| {
            if entry.index != index || entry.previous_hash != previous {
                entry.index = index;
                entry.previous_hash = previous;
                entry.refresh_hash();
            }
            if !is_valid_pow(&entry, difficulty) {
                entry = mine(entry, difficulty);
                resealed += 1;
            }
            previous = entry.hash;
            index += 1;
            entry
        })
        .collect();
    tracing::debug!("Sealed {} entries in order ({} re-mined)", sealed.len(), resealed);
    sealed
}

/// Miner bound to an explicit configuration.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    config: PowConfig,
}

impl ProofOfWork {
    /// Create a miner, validating the configuration first.
    pub fn new(config: PowConfig) -> Result<Self, ChainError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    /// Mine a single entry at the configured difficulty.
    pub fn mine(&self, entry: Entry) -> Entry {
        mine(entry, self.config.difficulty)
    }

    /// Mine a batch of entries concurrently, preserving submission order.
    pub async fn mine_parallel(&self, entries: Vec<Entry>) -> Result<Vec<Entry>, ChainError> {
        mine_parallel(entries, self.config.difficulty, self.config.worker_count).await
    }

    /// Chain and seal `entries` onto `tip` off the async executor.
    pub async fn seal_in_order(
        &self,
        entries: Vec<Entry>,
        tip: &Entry,
    ) -> Result<Vec<Entry>, ChainError> {
        seal_in_order(entries, tip, self.config.difficulty).await
    }

    /// Check an entry's proof at the configured difficulty.
    pub fn is_valid_pow(&self, entry: &Entry) -> bool {
        is_valid_pow(entry, self.config.difficulty)
    }
}
