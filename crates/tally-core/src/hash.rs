// crates/tally-core/src/hash.rs
//
// 256-bit digest type and SHA-256 helper.
//
// Difficulty is counted in leading zero hex characters (nibbles) of the
// digest, so a difficulty of `d` requires the first `d` nibbles to be zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of nibbles in a 256-bit digest. No difficulty above this can be met.
pub const MAX_NIBBLES: u32 = 64;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The all-zero digest, used as the genesis entry's `previous_hash`.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Count the leading zero nibbles of the digest.
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut total = 0u32;
        for b in &self.0 {
            if *b == 0 {
                total += 2;
            } else {
                if b >> 4 == 0 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    /// Whether the hex form of this digest starts with `difficulty` zeros.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_nibbles() >= difficulty
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

/// Compute the SHA-256 digest of the given bytes.
pub fn hash_bytes(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash256(output)
}
