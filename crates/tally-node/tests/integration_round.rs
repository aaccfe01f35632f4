// crates/tally-node/tests/integration_round.rs
//
// End-to-end rounds: peers rate each other, trust converges, and one mined
// entry per peer lands on the ledger in peer order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tally_chain::{Ledger, PowConfig, ProofOfWork};
use tally_core::crypto::{Ed25519Verifier, Keypair};
use tally_core::RatingSource;
use tally_node::{Node, NodeConfig, PeerRegistry, ReputationIngestion};
use tally_reputation::{ConvergenceConfig, ConvergenceOutcome, Peer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ledger(difficulty: u32, workers: usize) -> Ledger {
    Ledger::new(ProofOfWork::new(PowConfig::new(difficulty, workers)).unwrap())
}

fn ingestion() -> ReputationIngestion {
    ReputationIngestion::new(ConvergenceConfig::default()).unwrap()
}

/// peer-1 -> peer-2 (8), peer-2 -> peer-3 (6), peer-3 -> peer-1 (9).
fn three_cycle() -> Vec<Peer> {
    let mut peers: Vec<Peer> = (1..=3).map(|i| Peer::new(format!("peer-{}", i))).collect();
    peers[0].rate_peer("peer-2", 8.0);
    peers[1].rate_peer("peer-3", 6.0);
    peers[2].rate_peer("peer-1", 9.0);
    peers
}

/// Every peer rates a handful of others with its biased rating.
fn random_network(n: usize, seed: u64) -> Vec<Peer> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut peers: Vec<Peer> = (0..n)
        .map(|i| Peer::with_random_bias(format!("peer-{}", i), &mut rng))
        .collect();
    for i in 0..n {
        for _ in 0..3 {
            let target = rng.gen_range(0..n);
            if target == i {
                continue;
            }
            let rating = peers[i].biased_rating(&mut rng);
            let name = format!("peer-{}", target);
            peers[i].rate_peer(&name, rating);
        }
    }
    peers
}

/// peer-k rates peer-(k+1), wrapping around.
fn cycle(n: usize) -> Vec<Peer> {
    let mut peers: Vec<Peer> = (0..n).map(|i| Peer::new(format!("peer-{}", i))).collect();
    for (i, peer) in peers.iter_mut().enumerate() {
        peer.rate_peer(&format!("peer-{}", (i + 1) % n), 7.0);
    }
    peers
}

fn assert_probability_vector(scores: &[f64]) {
    let sum: f64 = scores.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9, "trust sums to {}", sum);
    assert!(scores.iter().all(|&t| t >= 0.0));
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_peer_cycle_at_zero_difficulty() {
    let peers = three_cycle();
    let mut ledger = ledger(0, 2);
    let report = ingestion().run_round(&peers, &mut ledger).await.unwrap();

    assert_probability_vector(&report.trust.scores);
    assert!(report.trust.scores.iter().all(|&t| t > 0.0));
    assert_eq!(report.trust.outcome, ConvergenceOutcome::Converged);

    assert_eq!(ledger.len(), 4);
    for entry in &ledger.entries()[1..] {
        assert_eq!(entry.nonce, 0);
    }
    assert!(ledger.validate_chain());
}

#[tokio::test]
async fn five_peers_two_workers_keep_peer_order() {
    let peers = random_network(5, 11);
    let mut ledger = ledger(2, 2);
    let report = ingestion().run_round(&peers, &mut ledger).await.unwrap();

    assert!(report.rejected.is_empty());
    let expected: Vec<(String, u64)> = peers
        .iter()
        .enumerate()
        .map(|(i, p)| (p.identifier().to_string(), 1 + i as u64))
        .collect();
    assert_eq!(report.appended, expected);

    for (i, peer) in peers.iter().enumerate() {
        let entry = ledger.get(1 + i as u64).unwrap();
        assert_eq!(entry.payload, peer.get_ratings());
        assert_eq!(entry.trust_score, report.trust.scores[i]);
        assert!(entry.hash.to_hex().starts_with("00"));
    }
    assert!(ledger.audit().is_ok());
}

#[tokio::test]
async fn consecutive_rounds_extend_one_chain() {
    let mut peers = random_network(4, 3);
    let mut ledger = ledger(1, 2);
    let ingestion = ingestion();

    for round in 0..3 {
        let report = ingestion.run_round(&peers, &mut ledger).await.unwrap();
        assert_eq!(report.appended.len(), 4);
        assert_probability_vector(&report.trust.scores);
        // Ratings keep accumulating between rounds.
        peers[0].rate_peer("peer-1", 2.0 + round as f64);
    }

    assert_eq!(ledger.len(), 13);
    assert!(ledger.validate_chain());
    for window in ledger.entries().windows(2) {
        assert_eq!(window[1].previous_hash, window[0].hash);
        assert_eq!(window[1].index, window[0].index + 1);
    }
}

#[tokio::test]
async fn ratings_of_unknown_peers_are_ignored() {
    let mut peers = three_cycle();
    peers[0].rate_peer("ghost", 10.0);
    let mut ledger = ledger(0, 1);
    let report = ingestion().run_round(&peers, &mut ledger).await.unwrap();

    assert_eq!(report.trust.len(), 3);
    assert_probability_vector(&report.trust.scores);
    // The dangling rating is still recorded in the entry's payload.
    assert!(ledger.get(1).unwrap().payload.ratings_for("ghost").is_some());
}

#[tokio::test]
async fn silent_network_keeps_uniform_trust() {
    let peers: Vec<Peer> = (0..4).map(|i| Peer::new(format!("peer-{}", i))).collect();
    let mut ledger = ledger(0, 2);
    let report = ingestion().run_round(&peers, &mut ledger).await.unwrap();

    assert_eq!(report.trust.outcome, ConvergenceOutcome::EmptyGraph);
    assert_eq!(report.trust.scores, vec![0.25; 4]);
    assert_eq!(report.appended.len(), 4);
}

#[tokio::test]
async fn empty_peer_list_appends_nothing() {
    let peers: Vec<Peer> = Vec::new();
    let mut ledger = ledger(1, 2);
    let report = ingestion().run_round(&peers, &mut ledger).await.unwrap();
    assert!(report.appended.is_empty());
    assert!(report.trust.is_empty());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn round_leaves_the_executor_free_while_mining() {
    let stop = Arc::new(AtomicBool::new(false));
    let ticker = {
        let stop = stop.clone();
        tokio::spawn(async move {
            let mut max_gap = Duration::ZERO;
            let mut last = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let now = Instant::now();
                max_gap = max_gap.max(now - last);
                last = now;
            }
            max_gap
        })
    };
    tokio::task::yield_now().await;

    let mut ledger = ledger(4, 5);
    let report = ingestion().run_round(&cycle(5), &mut ledger).await.unwrap();
    stop.store(true, Ordering::Relaxed);
    let max_gap = ticker.await.unwrap();

    assert_eq!(report.appended.len(), 5);
    assert!(ledger.validate_chain());
    assert!(
        max_gap < Duration::from_millis(150),
        "timer task stalled for {:?}",
        max_gap
    );
}

// ---------------------------------------------------------------------------
// Registry gating and node wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forged_registration_is_kept_off_the_ledger() {
    let honest = Keypair::generate();
    let forger = Keypair::generate();
    let msg = b"This is a registration message";

    let mut registry = PeerRegistry::new(Arc::new(Ed25519Verifier));
    registry.register_peer("peer-1", msg, &honest.sign(msg), &honest.public_key_bytes());
    registry.register_peer("peer-2", msg, &honest.sign(msg), &honest.public_key_bytes());
    // Signed by one key, presented with another.
    registry.register_peer("peer-3", msg, &forger.sign(msg), &honest.public_key_bytes());

    let ingestion = ingestion().with_registry(registry).require_verified(true);
    let mut ledger = ledger(0, 2);
    let report = ingestion.run_round(&three_cycle(), &mut ledger).await.unwrap();

    assert_eq!(report.skipped, vec!["peer-3".to_string()]);
    assert_eq!(
        report.appended,
        vec![("peer-1".to_string(), 1), ("peer-2".to_string(), 2)]
    );
    assert!(ledger.validate_chain());
}

#[tokio::test]
async fn node_from_toml_runs_rounds() {
    let config = NodeConfig::from_toml_str(
        r#"
        difficulty = 1
        worker_count = 3
        max_iterations = 100
        "#,
    )
    .unwrap();
    let node = Node::from_config(config).unwrap();
    assert_eq!(node.config().max_iterations, 100);

    let peers = random_network(3, 99);
    node.run_round(&peers).await.unwrap();
    node.run_round(&peers).await.unwrap();

    assert_eq!(node.ledger.read().await.len(), 7);
    assert!(node.validate_chain().await);
    for peer in &peers {
        assert_eq!(
            node.published_snapshot(peer.identifier()).await.unwrap(),
            Some(peer.get_ratings())
        );
    }
}
