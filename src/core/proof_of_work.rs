use crate::core::BlockHeader;
use crate::error::{BlockchainError, Result};
use crate::utils::sha256_digest;

/// A valid block hash must start with these bytes. Fixed for the lifetime
/// of the network; there is no retargeting.
pub const DIFFICULTY_PREFIX: [u8; 2] = [0x00, 0x00];

/// Proof-of-work engine over a block header.
///
/// The hashed encoding is the byte concatenation
/// `previous_hash || merkle_root || timestamp(i64 BE) || nonce(u32 BE)`,
/// exactly these four fields. Independent nodes only agree on genesis and
/// block hashes because this encoding is byte-identical everywhere; any
/// change to field order or integer width forks the network.
pub struct ProofOfWork {
    previous_hash: Vec<u8>,
    merkle_root: Vec<u8>,
    timestamp: i64,
}

impl ProofOfWork {
    pub fn new(header: &BlockHeader) -> ProofOfWork {
        ProofOfWork {
            previous_hash: header.get_previous_hash().to_vec(),
            merkle_root: header.get_merkle_root().to_vec(),
            timestamp: header.get_timestamp(),
        }
    }

    fn prepare_data(&self, nonce: u32) -> Vec<u8> {
        let mut data_bytes = Vec::with_capacity(self.previous_hash.len() + self.merkle_root.len() + 12);
        data_bytes.extend(&self.previous_hash);
        data_bytes.extend(&self.merkle_root);
        data_bytes.extend(self.timestamp.to_be_bytes());
        data_bytes.extend(nonce.to_be_bytes());
        data_bytes
    }

    /// Scan nonces from 0 until the digest starts with the difficulty
    /// prefix. Deterministic for a given header.
    pub fn run(&self) -> Result<(Vec<u8>, u32)> {
        for nonce in 0..=u32::MAX {
            let hash = sha256_digest(&self.prepare_data(nonce));
            if hash.starts_with(&DIFFICULTY_PREFIX) {
                return Ok((hash, nonce));
            }
        }
        // Unreachable at a two-byte prefix; a u32 scan covers it many
        // thousand times over.
        Err(BlockchainError::Mining(
            "nonce space exhausted without meeting difficulty".to_string(),
        ))
    }

    /// Recompute the hash under the stored nonce and require both the
    /// difficulty prefix and bit-identical equality with the header hash.
    pub fn validate(header: &BlockHeader) -> bool {
        let pow = ProofOfWork::new(header);
        let hash = sha256_digest(&pow.prepare_data(header.get_nonce()));

        hash.starts_with(&DIFFICULTY_PREFIX) && hash == header.get_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Block;

    #[test]
    fn test_mined_block_validates() {
        let block = Block::new_genesis_block().unwrap();
        assert!(ProofOfWork::validate(block.get_header()));
    }

    #[test]
    fn test_mined_hash_has_difficulty_prefix() {
        let block = Block::new_genesis_block().unwrap();
        assert!(block.get_hash().starts_with(&DIFFICULTY_PREFIX));
    }

    #[test]
    fn test_wrong_nonce_fails_validation() {
        let mut block = Block::new_genesis_block().unwrap();
        let new_nonce = block.get_header().get_nonce().wrapping_add(1);
        block.get_header_mut().set_nonce(new_nonce);
        assert!(!ProofOfWork::validate(block.get_header()));
    }

    #[test]
    fn test_tampered_hash_fails_validation() {
        let mut block = Block::new_genesis_block().unwrap();
        let mut hash = block.get_hash().to_vec();
        hash[31] ^= 0x01;
        block.get_header_mut().set_hash(hash);
        assert!(!ProofOfWork::validate(block.get_header()));
    }

    #[test]
    fn test_prepare_data_is_deterministic() {
        let block = Block::new_genesis_block().unwrap();
        let pow = ProofOfWork::new(block.get_header());
        assert_eq!(pow.prepare_data(42), pow.prepare_data(42));
        assert_ne!(pow.prepare_data(42), pow.prepare_data(43));
    }
}
