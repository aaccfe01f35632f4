// crates/tally-reputation/src/trust_graph.rs
//
// Rating graph and global trust computation.
//
// M[i][j] is peer i's mean rating of peer j. After normalization every column
// with any positive entry sums to 1; columns with nothing left after clipping
// negatives stay all-zero (no uniform redistribution, no self-loops).
//
// Global trust is the fixed point of t' = M·t, starting from the uniform
// vector. Because zero columns leak mass, t' is rescaled to unit L1 norm on
// every step *before* the distance to t is measured; otherwise a shrinking
// vector could look converged.
//
// The matrix is a BTreeMap keyed (row, col), so every sum is accumulated in
// the same order on every run and results are bit-for-bit reproducible.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use tally_core::RatingSource;

use crate::config::ConvergenceConfig;
use crate::error::ReputationError;

/// Ratings keyed by rater index, then by rated peer index, in submission order.
pub type IndexedRatings = BTreeMap<usize, BTreeMap<usize, Vec<f64>>>;

/// Columns whose sum is already this close to 1 are left untouched, which
/// makes a second `normalize` a no-op down to the bit.
const NORMALIZED_TOLERANCE: f64 = 1e-9;

/// How a call to `converge` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceOutcome {
    /// L1 distance between successive vectors fell below epsilon.
    Converged,
    /// `max_iterations` reached first.
    IterationCap,
    /// No peers or no ratings; the starting vector is returned unchanged.
    EmptyGraph,
    /// All mass flowed into zero columns; the last non-zero vector is returned.
    MassVanished,
}

/// Result of a trust computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustVector {
    /// Per-peer trust, indexed like the graph. Sums to 1 unless empty.
    pub scores: Vec<f64>,
    /// Power iterations applied.
    pub iterations: u32,
    /// L1 distance of the final step, if any step was taken.
    pub residual: Option<f64>,
    pub outcome: ConvergenceOutcome,
}

impl TrustVector {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.scores.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.scores.iter().sum()
    }
}

/// Sparse rating matrix plus the current trust vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustGraph {
    peer_count: usize,
    /// Sparse entries: (rater, rated) -> value.
    entries: BTreeMap<(usize, usize), f64>,
    /// Current trust vector; uniform until `converge` or `set_trust_vector`.
    trust: Vec<f64>,
    normalized: bool,
}

impl TrustGraph {
    /// Create a graph over `peer_count` peers with no ratings.
    pub fn new(peer_count: usize) -> Self {
        Self {
            peer_count,
            entries: BTreeMap::new(),
            trust: uniform(peer_count),
            normalized: false,
        }
    }

    /// Build a graph from rating sources. Peer indices follow slice order;
    /// ratings of identifiers not present in `peers` are skipped.
    pub fn from_sources<P: RatingSource>(peers: &[P]) -> Self {
        let index: HashMap<&str, usize> = peers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.identifier(), i))
            .collect();

        let mut ratings = IndexedRatings::new();
        for (i, peer) in peers.iter().enumerate() {
            let snapshot = peer.get_ratings();
            let row = ratings.entry(i).or_default();
            for (target, values) in snapshot.iter() {
                match index.get(target.as_str()) {
                    Some(&j) => {
                        row.insert(j, values.clone());
                    }
                    None => tracing::warn!(
                        "Peer {} rated unknown peer {}; ratings skipped",
                        peer.identifier(),
                        target
                    ),
                }
            }
        }

        let mut graph = Self::new(peers.len());
        // Indices come from `peers` itself, so they are always in range.
        graph.load(&ratings);
        graph
    }

    /// Replace the matrix with the mean of each rater's ratings of each peer.
    ///
    /// The input is copied; the graph keeps no reference to it. Resets the
    /// trust vector to uniform. Out-of-range indices leave the graph unchanged.
    pub fn ingest_ratings(&mut self, ratings: &IndexedRatings) -> Result<(), ReputationError> {
        for (&i, row) in ratings {
            self.check_index(i)?;
            for &j in row.keys() {
                self.check_index(j)?;
            }
        }
        self.load(ratings);
        Ok(())
    }

    fn load(&mut self, ratings: &IndexedRatings) {
        self.entries.clear();
        for (&i, row) in ratings {
            for (&j, values) in row {
                if values.is_empty() {
                    continue;
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                if mean != 0.0 {
                    self.entries.insert((i, j), mean);
                }
            }
        }
        self.trust = uniform(self.peer_count);
        self.normalized = false;
        tracing::debug!(
            "Ingested ratings: {} peers, {} non-zero entries",
            self.peer_count,
            self.entries.len()
        );
    }

    fn check_index(&self, index: usize) -> Result<(), ReputationError> {
        if index >= self.peer_count {
            return Err(ReputationError::PeerIndexOutOfRange {
                index,
                peer_count: self.peer_count,
            });
        }
        Ok(())
    }

    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    /// Matrix value M[row][col]; 0.0 when absent.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries.get(&(row, col)).copied().unwrap_or(0.0)
    }

    /// Number of stored non-zero entries.
    pub fn nonzero_count(&self) -> usize {
        self.entries.len()
    }

    pub fn column_sum(&self, col: usize) -> f64 {
        self.entries
            .iter()
            .filter(|((_, j), _)| *j == col)
            .map(|(_, v)| *v)
            .sum()
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// The current trust vector.
    pub fn trust_scores(&self) -> &[f64] {
        &self.trust
    }

    /// Use `start` as the starting vector for the next `converge`.
    ///
    /// Must have one non-negative entry per peer with a positive sum; it is
    /// rescaled to unit L1 norm.
    pub fn set_trust_vector(&mut self, start: Vec<f64>) -> Result<(), ReputationError> {
        if start.len() != self.peer_count {
            return Err(ReputationError::InvalidTrustVector(format!(
                "expected {} entries, got {}",
                self.peer_count,
                start.len()
            )));
        }
        if start.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ReputationError::InvalidTrustVector(
                "entries must be finite and non-negative".to_string(),
            ));
        }
        let norm: f64 = start.iter().sum();
        if norm <= 0.0 {
            return Err(ReputationError::InvalidTrustVector(
                "entries must not all be zero".to_string(),
            ));
        }
        self.trust = start.into_iter().map(|v| v / norm).collect();
        Ok(())
    }

    /// Clip negatives to zero, then scale each non-zero column to sum to 1.
    ///
    /// All-zero columns are left as they are.
    pub fn normalize(&mut self) {
        self.entries.retain(|_, v| *v > 0.0);

        let mut col_sums = vec![0.0_f64; self.peer_count];
        for (&(_, j), &v) in &self.entries {
            col_sums[j] += v;
        }

        for (&(_, j), v) in self.entries.iter_mut() {
            let sum = col_sums[j];
            if sum > 0.0 && (sum - 1.0).abs() > NORMALIZED_TOLERANCE {
                *v /= sum;
            }
        }
        self.normalized = true;
    }

    /// Run power iteration with the given stopping rule.
    pub fn converge_with(&mut self, config: &ConvergenceConfig) -> TrustVector {
        self.converge(config.max_iterations, config.epsilon)
    }

    /// Iterate t' = M·t, rescaling t' to unit L1 norm each step, until the L1
    /// distance to the previous vector is below `epsilon` or `max_iterations`
    /// steps have run. Normalizes the matrix first if needed.
    ///
    /// The final vector is also kept as the graph's trust vector.
    pub fn converge(&mut self, max_iterations: u32, epsilon: f64) -> TrustVector {
        if !self.normalized {
            self.normalize();
        }

        if self.peer_count == 0 || self.entries.is_empty() {
            tracing::debug!("Empty rating graph; returning starting trust vector");
            return TrustVector {
                scores: self.trust.clone(),
                iterations: 0,
                residual: None,
                outcome: ConvergenceOutcome::EmptyGraph,
            };
        }

        let mut t = self.trust.clone();
        let mut iterations = 0u32;
        let mut residual = None;
        let mut outcome = ConvergenceOutcome::IterationCap;

        while iterations < max_iterations {
            let mut next = vec![0.0_f64; self.peer_count];
            for (&(i, j), &m) in &self.entries {
                next[i] += m * t[j];
            }

            let norm: f64 = next.iter().map(|v| v.abs()).sum();
            if norm == 0.0 {
                outcome = ConvergenceOutcome::MassVanished;
                break;
            }
            for v in next.iter_mut() {
                *v /= norm;
            }
            iterations += 1;

            let delta: f64 = t.iter().zip(next.iter()).map(|(a, b)| (a - b).abs()).sum();
            residual = Some(delta);
            t = next;
            if delta < epsilon {
                outcome = ConvergenceOutcome::Converged;
                break;
            }
        }

        if outcome == ConvergenceOutcome::MassVanished {
            tracing::warn!(
                "Trust mass vanished after {} iterations; keeping last vector",
                iterations
            );
        } else {
            tracing::debug!(
                "Trust iteration finished: {:?} after {} iterations (residual {:?})",
                outcome,
                iterations,
                residual
            );
        }

        self.trust = t.clone();
        TrustVector {
            scores: t,
            iterations,
            residual,
            outcome,
        }
    }
}

fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}
