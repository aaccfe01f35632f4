// crates/tally-node/src/ingestion.rs
//
// One reputation round: rating snapshots -> global trust -> mined entries.
//
// Steps:
// 1. Build the trust graph from every peer's current rating snapshot
// 2. Normalize and converge to a trust vector
// 3. Package (snapshot, trust[i]) per peer into candidate entries, in peer order
// 4. Mine the candidates concurrently
// 5. Chain them onto the tip in order, re-mining where the link changed
// 6. Append them to the ledger in the same order
//
// Candidates are all built against the tip at submission time, so only the
// first one is still correctly linked after parallel mining. Step 5 reseals
// the rest on a blocking worker; the ledger then only validates.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use tally_chain::{Ledger, Rejection};
use tally_core::{BlobStore, Entry, RatingSnapshot, RatingSource};
use tally_reputation::{ConvergenceConfig, TrustGraph, TrustVector};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::registry::PeerRegistry;

/// Outcome of a single round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Converged trust, indexed like the peer slice passed to the round.
    pub trust: TrustVector,
    /// (peer, ledger index) for every entry appended, in append order.
    pub appended: Vec<(String, u64)>,
    /// Peers whose candidate the ledger refused, with the reason.
    pub rejected: Vec<(String, Rejection)>,
    /// Peers left out of the ledger because they are not verified.
    pub skipped: Vec<String>,
}

/// Blob key under which a peer's rating snapshot is published.
pub fn snapshot_key(identifier: &str) -> String {
    format!("peer/{}/ratings", identifier)
}

/// Drives rounds against a ledger.
#[derive(Debug, Clone)]
pub struct ReputationIngestion {
    convergence: ConvergenceConfig,
    require_verified: bool,
    registry: Option<PeerRegistry>,
}

impl ReputationIngestion {
    pub fn new(convergence: ConvergenceConfig) -> Result<Self, NodeError> {
        convergence.validate()?;
        Ok(Self {
            convergence,
            require_verified: false,
            registry: None,
        })
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        let mut ingestion = Self::new(config.convergence_config())?;
        ingestion.require_verified = config.require_verified;
        Ok(ingestion)
    }

    /// Attach the registry consulted when verification is required.
    pub fn with_registry(mut self, registry: PeerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn require_verified(mut self, require: bool) -> Self {
        self.require_verified = require;
        self
    }

    pub fn registry(&self) -> Option<&PeerRegistry> {
        self.registry.as_ref()
    }

    pub fn registry_mut(&mut self) -> Option<&mut PeerRegistry> {
        self.registry.as_mut()
    }

    pub fn convergence(&self) -> &ConvergenceConfig {
        &self.convergence
    }

    /// Whether `identifier` may get a ledger entry this round.
    ///
    /// With verification required and no registry attached, nobody is admitted.
    pub fn is_admitted(&self, identifier: &str) -> bool {
        if !self.require_verified {
            return true;
        }
        self.registry
            .as_ref()
            .map_or(false, |r| r.is_verified(identifier))
    }

    /// Converge global trust over the peers' current rating snapshots.
    pub fn compute_trust<P: RatingSource>(&self, peers: &[P]) -> TrustVector {
        let mut graph = TrustGraph::from_sources(peers);
        graph.normalize();
        graph.converge_with(&self.convergence)
    }

    /// Build one unmined candidate per admitted peer, in peer order, against
    /// the current tip. Non-admitted peers are returned separately.
    pub fn build_candidates<P: RatingSource>(
        &self,
        peers: &[P],
        trust: &TrustVector,
        ledger: &Ledger,
    ) -> (Vec<(String, Entry)>, Vec<String>) {
        let base_index = ledger.next_index();
        let previous_hash = ledger.tip().hash;
        let timestamp = now_seconds();

        let mut candidates = Vec::with_capacity(peers.len());
        let mut skipped = Vec::new();
        for (i, peer) in peers.iter().enumerate() {
            let id = peer.identifier();
            if !self.is_admitted(id) {
                tracing::warn!("Peer {} is not verified; skipping its entry", id);
                skipped.push(id.to_string());
                continue;
            }
            let entry = Entry::new(
                base_index + candidates.len() as u64,
                previous_hash,
                timestamp,
                peer.get_ratings(),
                trust.get(i).unwrap_or(0.0),
            );
            candidates.push((id.to_string(), entry));
        }
        (candidates, skipped)
    }

    /// Run a full round and append the resulting entries to `ledger`.
    pub async fn run_round<P: RatingSource>(
        &self,
        peers: &[P],
        ledger: &mut Ledger,
    ) -> Result<RoundReport, NodeError> {
        tracing::info!("Round: converging trust over {} peers", peers.len());
        let trust = self.compute_trust(peers);
        tracing::info!(
            "Round: trust {:?} after {} iterations ({:?})",
            trust.scores,
            trust.iterations,
            trust.outcome
        );

        let (candidates, skipped) = self.build_candidates(peers, &trust, ledger);
        let (ids, entries): (Vec<String>, Vec<Entry>) = candidates.into_iter().unzip();

        let pow = ledger.pow().clone();
        let mined = pow.mine_parallel(entries).await?;
        let sealed = pow.seal_in_order(mined, ledger.tip()).await?;

        let mut appended = Vec::new();
        let mut rejected = Vec::new();
        let mut pending: VecDeque<(String, Entry)> = ids.into_iter().zip(sealed).collect();
        while let Some((id, entry)) = pending.pop_front() {
            let index = entry.index;
            match ledger.add_block(entry) {
                Ok(()) => {
                    tracing::debug!("{}", ledger.tip());
                    appended.push((id, index));
                }
                Err(reason) => {
                    rejected.push((id, reason));
                    // Later entries were chained onto the refused one.
                    if !pending.is_empty() {
                        let (rest_ids, rest): (Vec<String>, Vec<Entry>) =
                            pending.drain(..).unzip();
                        let resealed = pow.seal_in_order(rest, ledger.tip()).await?;
                        pending = rest_ids.into_iter().zip(resealed).collect();
                    }
                }
            }
        }

        tracing::info!(
            "Round complete: {} appended, {} rejected, {} skipped (ledger length {})",
            appended.len(),
            rejected.len(),
            skipped.len(),
            ledger.len()
        );

        Ok(RoundReport {
            trust,
            appended,
            rejected,
            skipped,
        })
    }

    /// Publish every peer's rating snapshot as JSON under `peer/{id}/ratings`.
    /// Returns how many snapshots were written.
    pub async fn publish_snapshots<P: RatingSource>(
        &self,
        peers: &[P],
        store: &dyn BlobStore,
    ) -> Result<usize, NodeError> {
        for peer in peers {
            let bytes = serde_json::to_vec(&peer.get_ratings())?;
            store.put(&snapshot_key(peer.identifier()), bytes).await?;
        }
        tracing::debug!("Published {} rating snapshots", peers.len());
        Ok(peers.len())
    }
}

/// Fetch a previously published snapshot.
pub async fn fetch_snapshot(
    store: &dyn BlobStore,
    identifier: &str,
) -> Result<Option<RatingSnapshot>, NodeError> {
    match store.get(&snapshot_key(identifier)).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Wall-clock seconds since the Unix epoch, microsecond resolution.
fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tally_chain::{PowConfig, ProofOfWork};
    use tally_core::crypto::{Ed25519Verifier, Keypair};
    use tally_reputation::Peer;
    use tally_store::InMemoryBlobStore;

    fn ledger(difficulty: u32) -> Ledger {
        Ledger::new(ProofOfWork::new(PowConfig::new(difficulty, 2)).unwrap())
    }

    fn cycle() -> Vec<Peer> {
        let mut a = Peer::new("a");
        let mut b = Peer::new("b");
        let mut c = Peer::new("c");
        a.rate_peer("b", 5.0);
        b.rate_peer("c", 5.0);
        c.rate_peer("a", 5.0);
        vec![a, b, c]
    }

    #[test]
    fn candidates_follow_peer_order() {
        let ingestion = ReputationIngestion::new(ConvergenceConfig::default()).unwrap();
        let peers = cycle();
        let ledger = ledger(0);
        let trust = ingestion.compute_trust(&peers);
        let (candidates, skipped) = ingestion.build_candidates(&peers, &trust, &ledger);
        assert!(skipped.is_empty());
        let ids: Vec<&str> = candidates.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        for (k, (_, entry)) in candidates.iter().enumerate() {
            assert_eq!(entry.index, 1 + k as u64);
            assert_eq!(entry.previous_hash, ledger.tip().hash);
            assert_eq!(entry.trust_score, trust.scores[k]);
        }
    }

    #[tokio::test]
    async fn round_appends_one_entry_per_peer() {
        let ingestion = ReputationIngestion::new(ConvergenceConfig::default()).unwrap();
        let mut ledger = ledger(1);
        let report = ingestion.run_round(&cycle(), &mut ledger).await.unwrap();
        assert_eq!(report.appended.len(), 3);
        assert!(report.rejected.is_empty());
        assert_eq!(ledger.len(), 4);
        assert!(ledger.validate_chain());
    }

    #[tokio::test]
    async fn unverified_peers_are_skipped_when_required() {
        let mut registry = PeerRegistry::new(Arc::new(Ed25519Verifier));
        let keys = Keypair::generate();
        let msg = b"register";
        registry.register_peer("a", msg, &keys.sign(msg), &keys.public_key_bytes());

        let ingestion = ReputationIngestion::new(ConvergenceConfig::default())
            .unwrap()
            .with_registry(registry)
            .require_verified(true);
        let mut ledger = ledger(0);
        let report = ingestion.run_round(&cycle(), &mut ledger).await.unwrap();

        assert_eq!(report.appended, vec![("a".to_string(), 1)]);
        assert_eq!(report.skipped, vec!["b".to_string(), "c".to_string()]);
        // Trust still covers every peer.
        assert_eq!(report.trust.len(), 3);
    }

    #[test]
    fn required_verification_without_registry_admits_nobody() {
        let ingestion = ReputationIngestion::new(ConvergenceConfig::default())
            .unwrap()
            .require_verified(true);
        assert!(!ingestion.is_admitted("a"));
    }

    #[test]
    fn invalid_convergence_config_is_rejected() {
        let config = ConvergenceConfig {
            max_iterations: 40,
            epsilon: -1.0,
        };
        assert!(matches!(
            ReputationIngestion::new(config),
            Err(NodeError::Reputation(_))
        ));
    }

    #[tokio::test]
    async fn snapshots_round_trip_through_store() {
        let ingestion = ReputationIngestion::new(ConvergenceConfig::default()).unwrap();
        let store = InMemoryBlobStore::new();
        let peers = cycle();
        let written = ingestion.publish_snapshots(&peers, &store).await.unwrap();
        assert_eq!(written, 3);

        let fetched = fetch_snapshot(&store, "a").await.unwrap().unwrap();
        assert_eq!(fetched, peers[0].get_ratings());
        assert_eq!(fetch_snapshot(&store, "zed").await.unwrap(), None);
    }
}
