use crate::core::{Block, Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use log::{info, warn};
use reqwest::blocking::Client;
use std::time::Duration;

const PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// The HTTP client shared by broadcast and startup sync. The timeout
/// bounds how long a dead peer can stall a best-effort call.
pub fn new_client() -> Result<Client> {
    Client::builder()
        .timeout(PEER_TIMEOUT)
        .build()
        .map_err(|e| BlockchainError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Pull a peer's full chain from `<peer>/chain`.
pub fn fetch_chain(client: &Client, peer: &str) -> Result<Vec<Block>> {
    let url = format!("{peer}/chain");
    let resp = client.get(&url).send()?;

    if !resp.status().is_success() {
        return Err(BlockchainError::Network(format!(
            "{url} returned status {}",
            resp.status()
        )));
    }

    let chain: Blockchain = resp.json()?;
    Ok(chain.into_blocks())
}

/// Announce a freshly accepted block to every peer. Best-effort: each
/// failure is logged and the next peer is tried.
pub fn broadcast_block(client: &Client, peers: &[String], block: &Block) {
    for peer in peers {
        let url = format!("{peer}/newblock");
        match client.post(&url).json(block).send() {
            Ok(_) => info!("broadcast block to {url}"),
            Err(e) => warn!("broadcast to {url} failed: {e}"),
        }
    }
}

/// Forward an admitted transaction to every peer with the relay marker
/// set, so receivers do not broadcast it again. Best-effort.
pub fn relay_transaction(client: &Client, peers: &[String], tx: &Transaction) {
    for peer in peers {
        let url = format!("{peer}/newtx?relay=1");
        match client.post(&url).json(tx).send() {
            Ok(_) => info!("relayed transaction to {url}"),
            Err(e) => warn!("relay to {url} failed: {e}"),
        }
    }
}
