use crate::core::{calculate_merkle_root, ProofOfWork, Transaction};
use crate::error::Result;
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};

/// Fixed genesis timestamp. Every node mines the genesis header from the
/// same bytes and must arrive at the same hash and nonce.
const GENESIS_TIMESTAMP: i64 = 1_700_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    previous_hash: Vec<u8>,
    merkle_root: Vec<u8>,
    timestamp: i64,
    #[serde(default)]
    hash: Vec<u8>,
    #[serde(default)]
    nonce: u32,
}

impl BlockHeader {
    pub fn get_previous_hash(&self) -> &[u8] {
        &self.previous_hash
    }

    pub fn get_merkle_root(&self) -> &[u8] {
        &self.merkle_root
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn get_nonce(&self) -> u32 {
        self.nonce
    }

    #[cfg(test)]
    pub(crate) fn set_nonce(&mut self, nonce: u32) {
        self.nonce = nonce;
    }

    #[cfg(test)]
    pub(crate) fn set_hash(&mut self, hash: Vec<u8>) {
        self.hash = hash;
    }
}

/// A mined block: header plus the ordered transactions it packs. The
/// first transaction of a mined block is the coinbase reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    header: BlockHeader,
    txs: Vec<Transaction>,
}

impl Block {
    /// The deterministic block at height 0: empty previous hash, empty
    /// merkle root, fixed timestamp, no transactions, mined.
    pub fn new_genesis_block() -> Result<Block> {
        let header = BlockHeader {
            previous_hash: Vec::new(),
            merkle_root: Vec::new(),
            timestamp: GENESIS_TIMESTAMP,
            hash: Vec::new(),
            nonce: 0,
        };

        let mut block = Block {
            header,
            txs: Vec::new(),
        };
        block.mine()?;
        Ok(block)
    }

    /// Build and mine a block on top of `previous_hash`. Recomputes every
    /// transaction hash before taking the merkle root over them.
    pub fn new_block(previous_hash: Vec<u8>, mut txs: Vec<Transaction>) -> Result<Block> {
        for tx in &mut txs {
            tx.calculate_hash();
        }

        let tx_hashes: Vec<Vec<u8>> = txs.iter().map(|tx| tx.get_hash().to_vec()).collect();
        let merkle_root = calculate_merkle_root(&tx_hashes);

        let header = BlockHeader {
            previous_hash,
            merkle_root,
            timestamp: current_timestamp()?,
            hash: Vec::new(),
            nonce: 0,
        };

        let mut block = Block { header, txs };
        block.mine()?;
        Ok(block)
    }

    /// Run proof-of-work and write the winning hash and nonce back into
    /// the header.
    pub fn mine(&mut self) -> Result<()> {
        let pow = ProofOfWork::new(&self.header);
        let (hash, nonce) = pow.run()?;
        self.header.hash = hash;
        self.header.nonce = nonce;
        Ok(())
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    #[cfg(test)]
    pub(crate) fn get_header_mut(&mut self) -> &mut BlockHeader {
        &mut self.header
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn get_hash(&self) -> &[u8] {
        self.header.get_hash()
    }

    pub fn get_previous_hash(&self) -> &[u8] {
        self.header.get_previous_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DIFFICULTY_PREFIX;

    #[test]
    fn test_genesis_is_deterministic() {
        let a = Block::new_genesis_block().unwrap();
        let b = Block::new_genesis_block().unwrap();

        assert_eq!(a, b);
        assert_eq!(a.get_hash(), b.get_hash());
        assert_eq!(a.get_header().get_nonce(), b.get_header().get_nonce());
        assert!(a.get_previous_hash().is_empty());
        assert!(a.get_header().get_merkle_root().is_empty());
        assert!(a.get_transactions().is_empty());
    }

    #[test]
    fn test_new_block_links_and_meets_difficulty() {
        let genesis = Block::new_genesis_block().unwrap();
        let coinbase = Transaction::new_coinbase("miner".to_string(), 50).unwrap();

        let block = Block::new_block(genesis.get_hash().to_vec(), vec![coinbase]).unwrap();
        assert_eq!(block.get_previous_hash(), genesis.get_hash());
        assert!(block.get_hash().starts_with(&DIFFICULTY_PREFIX));
        assert_eq!(block.get_transactions().len(), 1);
    }

    #[test]
    fn test_merkle_root_matches_transaction_hashes() {
        let genesis = Block::new_genesis_block().unwrap();
        let txs = vec![
            Transaction::new_coinbase("miner".to_string(), 50).unwrap(),
            Transaction::new("alice".to_string(), "bob".to_string(), 3).unwrap(),
        ];

        let block = Block::new_block(genesis.get_hash().to_vec(), txs).unwrap();
        let tx_hashes: Vec<Vec<u8>> = block
            .get_transactions()
            .iter()
            .map(|tx| tx.get_hash().to_vec())
            .collect();
        assert_eq!(
            block.get_header().get_merkle_root(),
            calculate_merkle_root(&tx_hashes).as_slice()
        );
    }

    #[test]
    fn test_block_json_round_trip() {
        let block = Block::new_genesis_block().unwrap();
        let encoded = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&encoded).unwrap();
        assert_eq!(block, decoded);
    }
}
