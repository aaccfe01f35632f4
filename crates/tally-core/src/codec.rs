// crates/tally-core/src/codec.rs
//
// Canonical byte encoding of ledger entry fields for hashing.
//
// Layout (all integers big-endian):
//
//   "TALLY-ENTRY-v1"
//   index            u64
//   previous_hash    [u8; 32]
//   timestamp        f64 bits (canonicalised)
//   payload          u64 peer count, then per peer in lexicographic order:
//                      u64 id length, id UTF-8 bytes,
//                      u64 rating count, f64 bits per rating
//   trust_score      f64 bits (canonicalised)
//   nonce            u64
//
// Floats enter the preimage as IEEE-754 bit patterns, never as formatted
// text. -0.0 is folded into 0.0 and every NaN into a single quiet NaN so that
// logically equal values always encode the same. The nonce is the final field
// so a miner can hash the fixed prefix once and only feed the nonce per try.

use crate::hash::{hash_bytes, Hash256};
use crate::snapshot::RatingSnapshot;

/// Domain separator prepended to every entry preimage.
pub const ENTRY_DOMAIN: &[u8] = b"TALLY-ENTRY-v1";

const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// Bit pattern of `value` with signed zero and NaN payloads normalised.
pub fn canonical_f64_bits(value: f64) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_BITS
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_f64(out: &mut Vec<u8>, v: f64) {
    put_u64(out, canonical_f64_bits(v));
}

fn put_payload(out: &mut Vec<u8>, payload: &RatingSnapshot) {
    let entries = payload.sorted_entries();
    put_u64(out, entries.len() as u64);
    for (peer, ratings) in entries {
        put_u64(out, peer.len() as u64);
        out.extend_from_slice(peer.as_bytes());
        put_u64(out, ratings.len() as u64);
        for r in ratings {
            put_f64(out, *r);
        }
    }
}

/// Encode every field except the nonce. Appending the nonce's big-endian
/// bytes to this prefix yields exactly [`encode`].
pub fn encode_prefix(
    index: u64,
    previous_hash: &Hash256,
    timestamp: f64,
    payload: &RatingSnapshot,
    trust_score: f64,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    out.extend_from_slice(ENTRY_DOMAIN);
    put_u64(&mut out, index);
    out.extend_from_slice(previous_hash.as_bytes());
    put_f64(&mut out, timestamp);
    put_payload(&mut out, payload);
    put_f64(&mut out, trust_score);
    out
}

/// Encode all hashed entry fields.
pub fn encode(
    index: u64,
    previous_hash: &Hash256,
    timestamp: f64,
    payload: &RatingSnapshot,
    trust_score: f64,
    nonce: u64,
) -> Vec<u8> {
    let mut out = encode_prefix(index, previous_hash, timestamp, payload, trust_score);
    put_u64(&mut out, nonce);
    out
}

/// SHA-256 of the canonical encoding.
pub fn hash_fields(
    index: u64,
    previous_hash: &Hash256,
    timestamp: f64,
    payload: &RatingSnapshot,
    trust_score: f64,
    nonce: u64,
) -> Hash256 {
    hash_bytes(&encode(
        index,
        previous_hash,
        timestamp,
        payload,
        trust_score,
        nonce,
    ))
}
