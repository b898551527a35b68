use crate::config::Config;
use crate::core::Blockchain;
use crate::error::{BlockchainError, Result};
use crate::network::peers;
use crate::network::server::{NodeState, PeerServer};
use crate::storage::{FileStorage, Mempool};
use log::{error, info, warn};
use reqwest::blocking::Client;
use std::fs;
use std::sync::{Arc, Mutex};

/// A full node: persisted chain, mempool, peer set and HTTP server.
///
/// Construction loads the chain (or creates a fresh genesis), performs
/// the one-shot longest-chain sync against the configured peers, and
/// binds the listener; [`Node::start`] then serves until the process
/// exits.
pub struct Node {
    config: Config,
    server: PeerServer,
}

impl Node {
    pub fn new(config: Config) -> Result<Node> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            BlockchainError::Io(format!(
                "Failed to create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        let storage = FileStorage::new(config.chain_file());
        let chain = match storage.load() {
            Ok(chain) => {
                info!(
                    "loaded chain with {} blocks from {}",
                    chain.len(),
                    storage.path().display()
                );
                chain
            }
            Err(BlockchainError::NotFound(_)) => {
                info!("no chain file found, creating a fresh genesis");
                let chain = Blockchain::new_blockchain()?;
                storage.save(&chain)?;
                chain
            }
            Err(e) => return Err(e),
        };

        let state = Arc::new(Mutex::new(NodeState {
            chain,
            mempool: Mempool::new(),
        }));
        let storage = Arc::new(storage);
        let peers = Arc::new(config.peers.clone());
        let client = peers::new_client()?;

        // Exactly once, before the listener serves anything.
        sync_with_peers(&client, &peers, &state, &storage);

        let server = PeerServer::bind(
            config.port,
            Arc::clone(&state),
            Arc::clone(&peers),
            Arc::clone(&storage),
            client,
        )?;

        Ok(Node { config, server })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server(&self) -> &PeerServer {
        &self.server
    }

    /// Serve requests until the process exits.
    pub fn start(&self) {
        info!(
            "node starting on port {} with {} peers",
            self.config.port,
            self.config.peers.len()
        );
        self.server.run();
    }
}

/// Ask every peer for its chain and adopt the first strictly longer valid
/// one found; persist after each adoption. Per-peer failures are logged
/// and the next peer is tried.
fn sync_with_peers(
    client: &Client,
    peers: &[String],
    state: &Arc<Mutex<NodeState>>,
    storage: &FileStorage,
) {
    if peers.is_empty() {
        info!("no peers configured, skipping startup sync");
        return;
    }

    for peer in peers {
        info!("syncing chain from {peer}");
        let blocks = match peers::fetch_chain(client, peer) {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("failed to fetch chain from {peer}: {e}");
                continue;
            }
        };

        if blocks.is_empty() {
            warn!("{peer} returned an empty chain, skipping");
            continue;
        }

        let mut guard = state
            .lock()
            .expect("state mutex poisoned - this should never happen");
        if guard.chain.replace_if_longer(blocks) {
            info!(
                "adopted chain from {peer}, new height {}",
                guard.chain.height()
            );
            if let Err(e) = storage.save(&guard.chain) {
                error!("failed to persist synced chain: {e}");
            }
        } else {
            info!("{peer} has no longer valid chain, keeping ours");
        }
    }
}
