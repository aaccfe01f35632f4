// crates/tally-core/src/snapshot.rs
//
// Rating snapshot: the ratings one peer has given to others.
//
// Ratings for a given target are kept in submission order. The map itself is
// unordered; anything that needs a stable order (hashing, display) must go
// through `sorted_entries`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mapping from rated peer identifier to the ratings given, in submission order.
///
/// Values are conventionally in [1, 10] but are not bounded here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    ratings: HashMap<String, Vec<f64>>,
}

impl RatingSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rating for `peer`.
    pub fn record(&mut self, peer: impl Into<String>, rating: f64) {
        self.ratings.entry(peer.into()).or_default().push(rating);
    }

    /// Ratings given to `peer`, if any.
    pub fn ratings_for(&self, peer: &str) -> Option<&[f64]> {
        self.ratings.get(peer).map(Vec::as_slice)
    }

    /// Mean of the ratings given to `peer`. `None` if the peer was never rated.
    pub fn average(&self, peer: &str) -> Option<f64> {
        let ratings = self.ratings.get(peer)?;
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }

    /// Number of distinct peers rated.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Iterate in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<f64>)> {
        self.ratings.iter()
    }

    /// Entries sorted lexicographically by peer identifier.
    pub fn sorted_entries(&self) -> Vec<(&str, &[f64])> {
        let mut entries: Vec<(&str, &[f64])> = self
            .ratings
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl FromIterator<(String, Vec<f64>)> for RatingSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f64>)>>(iter: I) -> Self {
        Self {
            ratings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_submission_order() {
        let mut snap = RatingSnapshot::new();
        snap.record("peer-b", 7.0);
        snap.record("peer-b", 3.0);
        snap.record("peer-b", 9.0);
        assert_eq!(snap.ratings_for("peer-b"), Some(&[7.0, 3.0, 9.0][..]));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn average_of_unrated_peer_is_none() {
        let mut snap = RatingSnapshot::new();
        snap.record("peer-a", 4.0);
        snap.record("peer-a", 8.0);
        assert_eq!(snap.average("peer-a"), Some(6.0));
        assert_eq!(snap.average("peer-z"), None);
    }

    #[test]
    fn sorted_entries_are_lexicographic() {
        let mut snap = RatingSnapshot::new();
        snap.record("zeta", 1.0);
        snap.record("alpha", 2.0);
        snap.record("mu", 3.0);
        let keys: Vec<&str> = snap.sorted_entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["alpha", "mu", "zeta"]);
    }

    #[test]
    fn clone_does_not_alias() {
        let mut snap = RatingSnapshot::new();
        snap.record("peer-a", 5.0);
        let copy = snap.clone();
        snap.record("peer-a", 1.0);
        assert_eq!(copy.ratings_for("peer-a"), Some(&[5.0][..]));
    }
}
