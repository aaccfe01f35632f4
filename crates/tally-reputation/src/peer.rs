// crates/tally-reputation/src/peer.rs
//
// A rating peer: owns the ratings it has given and hands out copies.
//
// Each peer carries a fixed rating bias drawn once at creation. Biased
// ratings scale a uniform base rating by that bias, then truncate and clamp
// to the conventional [1, 10] scale.

use rand::Rng;
use serde::{Deserialize, Serialize};

use tally_core::{RatingSource, RatingSnapshot};

/// Lowest conventional rating.
pub const RATING_MIN: f64 = 1.0;
/// Highest conventional rating.
pub const RATING_MAX: f64 = 10.0;

/// Bias range for `Peer::with_random_bias`, upper bound exclusive.
const BIAS_RANGE: std::ops::Range<f64> = 0.7..1.5;

/// A participant that rates other peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    name: String,
    ratings: RatingSnapshot,
    rating_bias: f64,
}

impl Peer {
    /// A peer with neutral bias (1.0).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_bias(name, 1.0)
    }

    pub fn with_bias(name: impl Into<String>, rating_bias: f64) -> Self {
        Self {
            name: name.into(),
            ratings: RatingSnapshot::new(),
            rating_bias,
        }
    }

    /// A peer whose bias is drawn uniformly from [0.7, 1.5).
    pub fn with_random_bias<R: Rng>(name: impl Into<String>, rng: &mut R) -> Self {
        let bias = rng.gen_range(BIAS_RANGE);
        Self::with_bias(name, bias)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rating_bias(&self) -> f64 {
        self.rating_bias
    }

    /// Record a rating of `other`. Ratings of the same peer accumulate in order.
    pub fn rate_peer(&mut self, other: &str, rating: f64) {
        self.ratings.record(other, rating);
    }

    /// Draw a base rating in 1..=10, scale by this peer's bias, truncate, and
    /// clamp to [1, 10].
    pub fn biased_rating<R: Rng>(&self, rng: &mut R) -> f64 {
        let base = rng.gen_range(1..=10u32) as f64;
        (base * self.rating_bias).trunc().clamp(RATING_MIN, RATING_MAX)
    }
}

impl RatingSource for Peer {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn get_ratings(&self) -> RatingSnapshot {
        self.ratings.clone()
    }
}
