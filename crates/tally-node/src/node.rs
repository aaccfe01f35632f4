// crates/tally-node/src/node.rs
//
// Node: the ledger, the ingestion driver, and the snapshot store, wired from
// one NodeConfig.
//
// State sits behind Arc<RwLock<>> so a clone can be handed to other tokio
// tasks. A round holds the ledger write lock for its whole duration, which
// serializes rounds.

use std::sync::Arc;

use tokio::sync::RwLock;

use tally_chain::{Ledger, ProofOfWork};
use tally_core::crypto::Ed25519Verifier;
use tally_core::{BlobStore, RatingSnapshot, RatingSource};
use tally_reputation::TrustVector;
use tally_store::InMemoryBlobStore;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::ingestion::{fetch_snapshot, ReputationIngestion, RoundReport};
use crate::registry::PeerRegistry;

#[derive(Clone)]
pub struct Node {
    config: NodeConfig,
    /// The hash-linked reputation ledger.
    pub ledger: Arc<RwLock<Ledger>>,
    /// Round driver, including the peer registry.
    pub ingestion: Arc<RwLock<ReputationIngestion>>,
    /// Published rating snapshots.
    pub store: Arc<dyn BlobStore>,
    /// Trust from the most recent round (None until the first round).
    pub last_trust: Arc<RwLock<Option<TrustVector>>>,
}

impl Node {
    /// Build a node with an in-memory snapshot store and an ed25519 registry.
    pub fn from_config(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_store(config, Arc::new(InMemoryBlobStore::new()))
    }

    pub fn with_store(config: NodeConfig, store: Arc<dyn BlobStore>) -> Result<Self, NodeError> {
        let pow = ProofOfWork::new(config.pow_config())?;
        let ingestion = ReputationIngestion::from_config(&config)?
            .with_registry(PeerRegistry::new(Arc::new(Ed25519Verifier)));

        tracing::info!(
            "Node ready (difficulty {}, {} workers, require_verified {})",
            config.difficulty,
            config.worker_count,
            config.require_verified
        );

        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(Ledger::new(pow))),
            ingestion: Arc::new(RwLock::new(ingestion)),
            store,
            last_trust: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Register a peer with the node's registry. Returns whether it verified.
    pub async fn register_peer(
        &self,
        identifier: &str,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> bool {
        let mut ingestion = self.ingestion.write().await;
        match ingestion.registry_mut() {
            Some(registry) => registry.register_peer(identifier, message, signature, public_key),
            None => false,
        }
    }

    /// Publish every peer's snapshot, then run one round against the ledger.
    pub async fn run_round<P: RatingSource>(&self, peers: &[P]) -> Result<RoundReport, NodeError> {
        let ingestion = self.ingestion.read().await;
        ingestion
            .publish_snapshots(peers, self.store.as_ref())
            .await?;

        let report = {
            let mut ledger = self.ledger.write().await;
            ingestion.run_round(peers, &mut ledger).await?
        };

        *self.last_trust.write().await = Some(report.trust.clone());
        Ok(report)
    }

    /// Snapshot most recently published for `identifier`.
    pub async fn published_snapshot(
        &self,
        identifier: &str,
    ) -> Result<Option<RatingSnapshot>, NodeError> {
        fetch_snapshot(self.store.as_ref(), identifier).await
    }

    /// Whether the whole ledger still verifies.
    pub async fn validate_chain(&self) -> bool {
        self.ledger.read().await.validate_chain()
    }
}
