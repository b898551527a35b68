use crate::core::{Block, ProofOfWork, Transaction, COINBASE_SENDER};
use crate::error::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The replicated chain plus the account balances derived from it.
///
/// Balances are never persisted or sent over the wire; they are rebuilt
/// from the block sequence after every mutation and after load, so reads
/// always observe a map consistent with `blocks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blockchain {
    blocks: Vec<Block>,
    #[serde(skip)]
    balances: HashMap<String, i64>,
}

impl Blockchain {
    /// A fresh single-block chain holding the deterministic genesis.
    pub fn new_blockchain() -> Result<Blockchain> {
        let genesis = Block::new_genesis_block()?;
        let mut bc = Blockchain {
            blocks: vec![genesis],
            balances: HashMap::new(),
        };
        bc.rebuild_balances();
        Ok(bc)
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn get_blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Chain height: genesis sits at 0.
    pub fn height(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// Build, mine and append a block holding `txs`.
    pub fn add_block(&mut self, txs: Vec<Transaction>) -> Result<Block> {
        let previous_hash = self
            .latest_block()
            .map(|b| b.get_hash().to_vec())
            .unwrap_or_default();

        let block = Block::new_block(previous_hash, txs)?;
        self.push_block(block.clone());
        Ok(block)
    }

    /// Append an already-mined block. The caller has checked linkage and
    /// proof-of-work.
    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
        self.rebuild_balances();
    }

    /// Chain-link equality and proof-of-work for every non-genesis block.
    pub fn is_valid(&self) -> bool {
        for pair in self.blocks.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);

            if curr.get_previous_hash() != prev.get_hash() {
                return false;
            }
            if !ProofOfWork::validate(curr.get_header()) {
                return false;
            }
        }
        true
    }

    /// Adopt `candidate` iff it is strictly longer and fully valid,
    /// including the balance simulation. Ties never replace. Returns
    /// whether a replacement happened; on false the local chain is
    /// untouched.
    pub fn replace_if_longer(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            return false;
        }
        if !Self::is_valid_chain(&candidate) {
            return false;
        }

        self.blocks = candidate;
        self.rebuild_balances();
        true
    }

    /// Full validity of a candidate chain: non-empty, linked, every block
    /// passing proof-of-work, and a transaction replay under which no
    /// non-coinbase sender ever goes negative. The replay is the only
    /// check that can reject a longer, link-consistent, PoW-valid chain.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        if blocks.is_empty() {
            return false;
        }

        let mut state: HashMap<String, i64> = HashMap::new();

        for (i, block) in blocks.iter().enumerate() {
            if i > 0 && block.get_previous_hash() != blocks[i - 1].get_hash() {
                return false;
            }
            if !ProofOfWork::validate(block.get_header()) {
                return false;
            }

            for tx in block.get_transactions() {
                let amount = i64::from(tx.get_value());
                let from = tx.get_from();

                if !from.is_empty() && from != COINBASE_SENDER {
                    let balance = state.entry(from.to_string()).or_insert(0);
                    if *balance < amount {
                        debug!("chain replay drives {from} negative, rejecting");
                        return false;
                    }
                    *balance -= amount;
                }
                if !tx.get_to().is_empty() {
                    *state.entry(tx.get_to().to_string()).or_insert(0) += amount;
                }
            }
        }
        true
    }

    /// Zero the balance map and replay every transaction in block order.
    /// Empty and `COINBASE` senders are skipped on the debit side, empty
    /// recipients on the credit side.
    pub fn rebuild_balances(&mut self) {
        self.balances.clear();

        for block in &self.blocks {
            for tx in block.get_transactions() {
                let amount = i64::from(tx.get_value());
                let from = tx.get_from();

                if !from.is_empty() && from != COINBASE_SENDER {
                    *self.balances.entry(from.to_string()).or_insert(0) -= amount;
                }
                if !tx.get_to().is_empty() {
                    *self.balances.entry(tx.get_to().to_string()).or_insert(0) += amount;
                }
            }
        }
    }

    /// Confirmed on-chain balance; 0 for unknown addresses. Pending
    /// mempool transactions are not reflected here.
    pub fn get_balance(&self, addr: &str) -> i64 {
        self.balances.get(addr).copied().unwrap_or(0)
    }
}
