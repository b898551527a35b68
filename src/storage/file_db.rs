use crate::core::Blockchain;
use crate::error::{BlockchainError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Single-file JSON snapshot of the chain.
///
/// The file is the node's only durable state; deleting it yields a fresh
/// genesis on the next start. Balances are not part of the snapshot and
/// are rebuilt on load.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileStorage {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the chain snapshot, replacing any previous file.
    ///
    /// Serializes first, then writes a sibling temp file and renames it
    /// over the target, so a failure partway never clobbers the previous
    /// snapshot.
    pub fn save(&self, blockchain: &Blockchain) -> Result<()> {
        let data = serde_json::to_vec_pretty(blockchain)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &data)
            .map_err(|e| BlockchainError::Io(format!("Failed to write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            BlockchainError::Io(format!("Failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }

    /// Read the chain snapshot back.
    ///
    /// A missing file is reported as [`BlockchainError::NotFound`] so the
    /// caller can create a fresh genesis; every other failure is an
    /// ordinary error. A decoded chain with zero blocks is corrupt.
    pub fn load(&self) -> Result<Blockchain> {
        let data = fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlockchainError::NotFound(format!("no chain file at {}", self.path.display()))
            } else {
                BlockchainError::Io(format!("Failed to read {}: {e}", self.path.display()))
            }
        })?;

        let mut blockchain: Blockchain = serde_json::from_slice(&data)?;
        if blockchain.is_empty() {
            return Err(BlockchainError::Storage(
                "loaded blockchain has no blocks".to_string(),
            ));
        }

        blockchain.rebuild_balances();
        Ok(blockchain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("chain_9001.json"));

        let mut bc = Blockchain::new_blockchain().unwrap();
        bc.add_block(vec![Transaction::new_coinbase("miner".to_string(), 50).unwrap()])
            .unwrap();
        storage.save(&bc).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.get_blocks(), bc.get_blocks());
        // Balances come back from the replay, not the file.
        assert_eq!(loaded.get_balance("miner"), 50);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("chain_9001.json"));

        match storage.load() {
            Err(BlockchainError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_file_is_not_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain_9001.json");
        fs::write(&path, b"{ not json").unwrap();

        match FileStorage::new(path).load() {
            Err(BlockchainError::Serialization(_)) => {}
            other => panic!("expected Serialization, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_block_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain_9001.json");
        fs::write(&path, br#"{"blocks": []}"#).unwrap();

        match FileStorage::new(path).load() {
            Err(BlockchainError::Storage(_)) => {}
            other => panic!("expected Storage, got {other:?}"),
        }
    }

    #[test]
    fn test_save_truncates_previous_snapshot() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("chain_9001.json"));

        let mut long = Blockchain::new_blockchain().unwrap();
        for _ in 0..3 {
            long.add_block(vec![Transaction::new_coinbase("miner".to_string(), 50).unwrap()])
                .unwrap();
        }
        storage.save(&long).unwrap();

        let short = Blockchain::new_blockchain().unwrap();
        storage.save(&short).unwrap();

        assert_eq!(storage.load().unwrap().len(), 1);
        // No temp file left behind.
        assert!(!storage.path().with_extension("json.tmp").exists());
    }
}
