// crates/tally-chain/src/ledger.rs
//
// Append-only, hash-linked ledger of reputation entries.
//
// The ledger is created with its genesis sentinel already in place and grows
// by exactly one entry per accepted `add_block`. A rejected candidate never
// touches the sequence. There is a single authoritative chain; no forks.
//
// Linkage is assigned by the ledger, not trusted from the caller: a candidate
// whose stored hash is consistent with its fields is re-pointed at the current
// tip (and re-mined if that breaks its proof) before validation. A candidate
// whose stored hash is already inconsistent is validated as submitted, so
// tampering is reported rather than silently re-sealed.

use tally_core::{Entry, Hash256};

use crate::error::{AuditFailure, Rejection};
use crate::pow::ProofOfWork;

/// Ordered, append-only sequence of entries, indexed 0..n-1.
#[derive(Debug, Clone)]
pub struct Ledger {
    entries: Vec<Entry>,
    pow: ProofOfWork,
}

impl Ledger {
    /// Create a ledger holding only the genesis entry.
    pub fn new(pow: ProofOfWork) -> Self {
        let mut ledger = Self {
            entries: Vec::new(),
            pow,
        };
        ledger.append_genesis();
        ledger
    }

    /// Append the genesis sentinel. Only called from `new`.
    fn append_genesis(&mut self) -> Entry {
        let genesis = Entry::genesis();
        tracing::debug!(hash = %genesis.hash, "Genesis entry appended");
        self.entries.push(genesis.clone());
        genesis
    }

    /// Number of entries, genesis included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once constructed; the genesis entry is never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended entry.
    pub fn tip(&self) -> &Entry {
        &self.entries[self.entries.len() - 1]
    }

    pub fn genesis(&self) -> &Entry {
        &self.entries[0]
    }

    pub fn get(&self, index: u64) -> Option<&Entry> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty()
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Index the next accepted entry must carry.
    pub fn next_index(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Link, mine if needed, validate, and append a candidate.
    ///
    /// On rejection the candidate is dropped and the ledger is unchanged.
    pub fn add_block(&mut self, mut candidate: Entry) -> Result<(), Rejection> {
        let expected = self.next_index();
        if candidate.index != expected {
            let reason = Rejection::IndexOutOfSequence {
                expected,
                found: candidate.index,
            };
            tracing::warn!("Rejected candidate: {}", reason);
            return Err(reason);
        }

        if candidate.is_hash_consistent() {
            let tip_hash = self.tip().hash;
            if candidate.previous_hash != tip_hash {
                candidate.relink(tip_hash);
            }
            if !candidate.hash.meets_difficulty(self.pow.difficulty()) {
                candidate = self.pow.mine(candidate);
            }
        }

        if let Err(reason) = self.check_candidate(&candidate) {
            tracing::warn!("Rejected candidate {}: {}", candidate.index, reason);
            return Err(reason);
        }

        tracing::debug!(
            index = candidate.index,
            nonce = candidate.nonce,
            hash = %candidate.hash,
            "Entry appended"
        );
        self.entries.push(candidate);
        Ok(())
    }

    /// Validate a candidate against the current tip without appending it.
    ///
    /// Checks, in order: index, linkage, puzzle, integrity.
    pub fn check_candidate(&self, candidate: &Entry) -> Result<(), Rejection> {
        let expected = self.next_index();
        if candidate.index != expected {
            return Err(Rejection::IndexOutOfSequence {
                expected,
                found: candidate.index,
            });
        }
        check_successor(self.tip(), candidate, self.pow.difficulty())
    }

    /// Append candidates one at a time in the given order.
    ///
    /// Each candidate is re-indexed and re-pointed at the tip at the moment it
    /// is appended, then mined. Returns the per-candidate outcome.
    pub fn mine_sequentially(&mut self, candidates: Vec<Entry>) -> Vec<Result<(), Rejection>> {
        candidates
            .into_iter()
            .map(|mut candidate| {
                candidate.index = self.next_index();
                candidate.previous_hash = self.tip().hash;
                candidate.refresh_hash();
                self.add_block(candidate)
            })
            .collect()
    }

    /// Re-walk the whole chain from genesis and report the first violation.
    pub fn audit(&self) -> Result<(), AuditFailure> {
        let difficulty = self.pow.difficulty();
        for (position, entry) in self.entries.iter().enumerate() {
            let position = position as u64;
            let fail = |reason| AuditFailure { position, reason };

            if entry.index != position {
                return Err(fail(Rejection::IndexOutOfSequence {
                    expected: position,
                    found: entry.index,
                }));
            }

            if position == 0 {
                if entry.previous_hash != Hash256::ZERO {
                    return Err(fail(Rejection::LinkageMismatch {
                        expected: Hash256::ZERO,
                        found: entry.previous_hash,
                    }));
                }
                let computed = entry.compute_hash();
                if entry.hash != computed {
                    return Err(fail(Rejection::HashIntegrityFailure {
                        stored: entry.hash,
                        computed,
                    }));
                }
                continue;
            }

            let previous = &self.entries[position as usize - 1];
            check_successor(previous, entry, difficulty).map_err(fail)?;
        }
        Ok(())
    }

    /// Whether every entry satisfies the ledger invariants.
    pub fn validate_chain(&self) -> bool {
        match self.audit() {
            Ok(()) => true,
            Err(failure) => {
                tracing::warn!("{}", failure);
                false
            }
        }
    }
}

/// Linkage, puzzle and integrity checks of `entry` against its predecessor.
fn check_successor(previous: &Entry, entry: &Entry, difficulty: u32) -> Result<(), Rejection> {
    if entry.previous_hash != previous.hash {
        return Err(Rejection::LinkageMismatch {
            expected: previous.hash,
            found: entry.previous_hash,
        });
    }
    if !entry.hash.meets_difficulty(difficulty) {
        return Err(Rejection::PuzzleUnsatisfied {
            difficulty,
            hash: entry.hash,
        });
    }
    let computed = entry.compute_hash();
    if entry.hash != computed {
        return Err(Rejection::HashIntegrityFailure {
            stored: entry.hash,
            computed,
        });
    }
    Ok(())
}
