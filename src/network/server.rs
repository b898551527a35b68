use crate::core::{Block, Blockchain, ProofOfWork, Transaction, COINBASE_SENDER};
use crate::error::{BlockchainError, Result};
use crate::network::nickname::{display_name, resolve_address};
use crate::network::peers;
use crate::storage::{FileStorage, Mempool};
use crate::utils::to_hex;
use log::{error, info, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tiny_http::{Header, Request, Response, Server};

/// Coinbase value credited to the miner of every block.
pub const BLOCK_REWARD: u32 = 50;

/// How many pending transactions a block packs at most, coinbase excluded.
pub const MAX_TX_PER_BLOCK: usize = 5;

/// The chain and the mempool form one logical state machine; every
/// handler observes or mutates them under the single mutex wrapping this
/// struct.
pub struct NodeState {
    pub chain: Blockchain,
    pub mempool: Mempool,
}

/// Everything a request handler thread needs.
#[derive(Clone)]
struct HandlerCtx {
    state: Arc<Mutex<NodeState>>,
    peers: Arc<Vec<String>>,
    storage: Arc<FileStorage>,
    client: Client,
    port: u16,
}

/// The node's HTTP face: chain queries, transaction admission, block
/// ingestion, mining and status.
pub struct PeerServer {
    http: Server,
    ctx: HandlerCtx,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    port: u16,
    height: usize,
    block_count: usize,
    mempool_size: usize,
    peer_count: usize,
    peers: Vec<String>,
    latest_hash: String,
    latest_merkle: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    input: String,
    address: String,
    name: String,
    balance: i64,
}

impl PeerServer {
    pub fn bind(
        port: u16,
        state: Arc<Mutex<NodeState>>,
        peers: Arc<Vec<String>>,
        storage: Arc<FileStorage>,
        client: Client,
    ) -> Result<PeerServer> {
        let http = Server::http(("0.0.0.0", port))
            .map_err(|e| BlockchainError::Network(format!("Failed to bind port {port}: {e}")))?;

        Ok(PeerServer {
            http,
            ctx: HandlerCtx {
                state,
                peers,
                storage,
                client,
                port,
            },
        })
    }

    /// The address the listener actually bound, useful when the port was 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Accept loop: one handler thread per request. Requests run to
    /// completion; there is no shutdown protocol.
    pub fn run(&self) {
        info!("listening on port {}", self.ctx.port);

        for request in self.http.incoming_requests() {
            let ctx = self.ctx.clone();
            thread::spawn(move || handle_request(&ctx, request));
        }
    }
}

fn lock_state(ctx: &HandlerCtx) -> MutexGuard<'_, NodeState> {
    ctx.state
        .lock()
        .expect("state mutex poisoned - this should never happen")
}

fn handle_request(ctx: &HandlerCtx, request: Request) {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (url, String::new()),
    };

    let outcome = match path.as_str() {
        "/latest" => handle_latest(ctx, request),
        "/chain" => handle_chain(ctx, request),
        "/newblock" => handle_new_block(ctx, request),
        "/newtx" => handle_new_tx(ctx, request, &query),
        "/mine" => handle_mine(ctx, request, &query),
        "/stats" => handle_stats(ctx, request),
        "/balance" => handle_balance(ctx, request, &query),
        _ => request.respond(Response::empty(404)),
    };

    if let Err(e) = outcome {
        error!("failed to write response for {path}: {e}");
    }
}

fn content_type_json() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid")
}

fn respond_json<T: Serialize>(request: Request, value: &T) -> std::io::Result<()> {
    match serde_json::to_string(value) {
        Ok(body) => request.respond(Response::from_string(body).with_header(content_type_json())),
        Err(e) => {
            error!("failed to encode response: {e}");
            request.respond(Response::from_string("encoding error").with_status_code(500))
        }
    }
}

fn respond_bad_request(request: Request, reason: &str) -> std::io::Result<()> {
    request.respond(Response::from_string(reason).with_status_code(400))
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn read_body(request: &mut Request) -> std::result::Result<String, std::io::Error> {
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    Ok(body)
}

fn handle_latest(ctx: &HandlerCtx, request: Request) -> std::io::Result<()> {
    let latest: Option<Block> = lock_state(ctx).chain.latest_block().cloned();
    respond_json(request, &latest)
}

fn handle_chain(ctx: &HandlerCtx, request: Request) -> std::io::Result<()> {
    // Serialized under the lock so the snapshot is consistent.
    let body = {
        let state = lock_state(ctx);
        serde_json::to_string(&state.chain)
    };

    match body {
        Ok(body) => request.respond(Response::from_string(body).with_header(content_type_json())),
        Err(e) => {
            error!("failed to encode chain: {e}");
            request.respond(Response::from_string("encoding error").with_status_code(500))
        }
    }
}

/// Ingest a block mined elsewhere. Link and proof-of-work are checked;
/// the transactions inside are trusted to have been validated by the
/// sender, a known limitation of the protocol.
fn handle_new_block(ctx: &HandlerCtx, mut request: Request) -> std::io::Result<()> {
    let body = match read_body(&mut request) {
        Ok(body) => body,
        Err(e) => {
            warn!("failed to read /newblock body: {e}");
            return respond_bad_request(request, "unreadable body");
        }
    };

    let block: Block = match serde_json::from_str(&body) {
        Ok(block) => block,
        Err(e) => {
            warn!("rejecting undecodable block: {e}");
            return respond_bad_request(request, "invalid block");
        }
    };

    info!("received block {}", to_hex(block.get_hash()));

    let mut state = lock_state(ctx);

    let latest_hash = match state.chain.latest_block() {
        Some(latest) => latest.get_hash().to_vec(),
        None => {
            warn!("local chain is empty, refusing block");
            drop(state);
            return respond_bad_request(request, "local chain is empty");
        }
    };

    if block.get_previous_hash() != latest_hash.as_slice() {
        warn!("previous hash does not match local tip, refusing block");
        drop(state);
        return respond_bad_request(request, "previous hash mismatch");
    }

    if !ProofOfWork::validate(block.get_header()) {
        warn!("proof of work check failed, refusing block");
        drop(state);
        return respond_bad_request(request, "invalid proof of work");
    }

    state.chain.push_block(block);
    if let Err(e) = ctx.storage.save(&state.chain) {
        error!("failed to persist chain: {e}");
    }
    let height = state.chain.height();
    drop(state);

    info!("accepted block, new height {height}");
    request.respond(Response::from_string("block accepted"))
}

/// Transaction admission, in order: signature material present, sender
/// address bound to the public key, signature valid, value covered by the
/// confirmed balance minus what the mempool has already promised.
/// Returns the literal reject reason on failure; state is untouched then.
fn admit_transaction(
    state: &mut NodeState,
    tx: &mut Transaction,
) -> std::result::Result<(), &'static str> {
    if !tx.is_coinbase() {
        if tx.get_pub_key().is_empty() || tx.get_sig().is_empty() {
            return Err("missing pubkey or signature");
        }

        if tx.get_from() != tx.expected_from_address() {
            return Err("forged from address");
        }

        if !tx.verify() {
            return Err("invalid signature");
        }
    }

    let from = tx.get_from().to_string();
    if !from.is_empty() && from != COINBASE_SENDER {
        let confirmed = state.chain.get_balance(&from);
        let pending = state.mempool.pending_outgoing(&from);
        let available = confirmed - pending;

        if i64::from(tx.get_value()) > available {
            return Err("balance not enough");
        }
    }

    tx.calculate_hash();
    state.mempool.push(tx.clone());
    Ok(())
}

fn handle_new_tx(ctx: &HandlerCtx, mut request: Request, query: &str) -> std::io::Result<()> {
    let body = match read_body(&mut request) {
        Ok(body) => body,
        Err(e) => {
            warn!("failed to read /newtx body: {e}");
            return respond_bad_request(request, "unreadable body");
        }
    };

    let mut tx: Transaction = match serde_json::from_str(&body) {
        Ok(tx) => tx,
        Err(e) => {
            warn!("rejecting undecodable transaction: {e}");
            return respond_bad_request(request, "invalid transaction");
        }
    };

    let mempool_size = {
        let mut state = lock_state(ctx);
        if let Err(reason) = admit_transaction(&mut state, &mut tx) {
            warn!(
                "rejecting transaction {} -> {}: {reason}",
                tx.get_from(),
                tx.get_to()
            );
            drop(state);
            return respond_bad_request(request, reason);
        }
        state.mempool.len()
    };

    info!(
        "accepted transaction {} -> {} value {}, mempool size {mempool_size}",
        tx.get_from(),
        tx.get_to(),
        tx.get_value()
    );

    // First-hop submissions are forwarded once; relayed copies stop here.
    if query_param(query, "relay") != Some("1") {
        peers::relay_transaction(&ctx.client, &ctx.peers, &tx);
    }

    request.respond(Response::from_string("transaction accepted"))
}

/// Mine a block crediting `addr`. The candidate is assembled under the
/// lock, the nonce scan runs with the lock released, and the result is
/// only appended if the tip has not moved meanwhile; otherwise the
/// drained transactions go back to the front of the mempool.
fn handle_mine(ctx: &HandlerCtx, request: Request, query: &str) -> std::io::Result<()> {
    let miner_addr = match query_param(query, "addr") {
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => {
            return respond_bad_request(request, "missing miner address, use /mine?addr=<address>")
        }
    };

    let (previous_hash, drained) = {
        let mut state = lock_state(ctx);
        let previous_hash = state
            .chain
            .latest_block()
            .map(|b| b.get_hash().to_vec())
            .unwrap_or_default();
        let count = state.mempool.len().min(MAX_TX_PER_BLOCK);
        (previous_hash, state.mempool.take_front(count))
    };

    info!(
        "mining a block with {} pending transactions for {miner_addr}",
        drained.len()
    );

    let mined = Transaction::new_coinbase(miner_addr, BLOCK_REWARD).and_then(|coinbase| {
        let mut txs = Vec::with_capacity(drained.len() + 1);
        txs.push(coinbase);
        txs.extend(drained.iter().cloned());
        Block::new_block(previous_hash.clone(), txs)
    });

    let block = match mined {
        Ok(block) => block,
        Err(e) => {
            error!("mining failed: {e}");
            let mut state = lock_state(ctx);
            state.mempool.restore_front(drained);
            drop(state);
            return request.respond(Response::from_string("mining failed").with_status_code(500));
        }
    };

    let mut state = lock_state(ctx);
    let tip_unchanged = state
        .chain
        .latest_block()
        .map(|b| b.get_hash() == previous_hash.as_slice())
        .unwrap_or(false);

    if !tip_unchanged {
        warn!("chain advanced during mining, discarding stale block");
        state.mempool.restore_front(drained);
        drop(state);
        return respond_bad_request(request, "stale block: chain advanced during mining");
    }

    state.chain.push_block(block.clone());
    if let Err(e) = ctx.storage.save(&state.chain) {
        error!("failed to persist chain: {e}");
    }
    let height = state.chain.height();
    let remaining = state.mempool.len();
    drop(state);

    let block_hash = to_hex(block.get_hash());
    info!("mined block at height {height}, hash {block_hash}");

    peers::broadcast_block(&ctx.client, &ctx.peers, &block);

    let summary = format!(
        "mined block: height={height}, hash={block_hash}, packed={} transactions (incl. coinbase), mempool={remaining}\n",
        block.get_transactions().len()
    );
    request.respond(Response::from_string(summary))
}

fn handle_stats(ctx: &HandlerCtx, request: Request) -> std::io::Result<()> {
    let stats = {
        let state = lock_state(ctx);
        let (latest_hash, latest_merkle) = match state.chain.latest_block() {
            Some(latest) => (
                to_hex(latest.get_hash()),
                to_hex(latest.get_header().get_merkle_root()),
            ),
            None => (String::new(), String::new()),
        };

        StatsResponse {
            port: ctx.port,
            height: state.chain.height(),
            block_count: state.chain.len(),
            mempool_size: state.mempool.len(),
            peer_count: ctx.peers.len(),
            peers: ctx.peers.as_ref().clone(),
            latest_hash,
            latest_merkle,
        }
    };

    respond_json(request, &stats)
}

fn handle_balance(ctx: &HandlerCtx, request: Request, query: &str) -> std::io::Result<()> {
    let raw = match query_param(query, "addr") {
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => {
            return request.respond(
                Response::from_string(r#"{"error": "missing addr parameter"}"#)
                    .with_status_code(400)
                    .with_header(content_type_json()),
            )
        }
    };

    let address = resolve_address(&raw);
    let balance = lock_state(ctx).chain.get_balance(&address);

    let resp = BalanceResponse {
        input: raw,
        name: display_name(&address),
        address,
        balance,
    };
    respond_json(request, &resp)
}
