use crate::error::{BlockchainError, Result};
use crate::utils::{new_key_pair, pub_key_to_address, public_key_from_pkcs8};
use std::fs;
use std::path::Path;

/// An ECDSA P-256 key pair held as its PKCS#8 document plus the exported
/// public-key bytes.
#[derive(Clone)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        let public_key = public_key_from_pkcs8(&pkcs8)?;
        Ok(Wallet { pkcs8, public_key })
    }

    /// Load a wallet from a key file written by [`Wallet::save_key_file`].
    pub fn load_key_file(path: &Path) -> Result<Wallet> {
        let pkcs8 = fs::read(path)
            .map_err(|e| BlockchainError::Wallet(format!("Failed to read key file {}: {e}", path.display())))?;
        let public_key = public_key_from_pkcs8(&pkcs8)
            .map_err(|_| BlockchainError::Wallet(format!("{} is not a PKCS#8 P-256 key", path.display())))?;
        Ok(Wallet { pkcs8, public_key })
    }

    /// Persist the private key as its raw PKCS#8 DER document. Losing the
    /// file loses the account.
    pub fn save_key_file(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.pkcs8)
            .map_err(|e| BlockchainError::Wallet(format!("Failed to write key file {}: {e}", path.display())))?;
        Ok(())
    }

    pub fn get_address(&self) -> String {
        pub_key_to_address(&self.public_key)
    }

    pub fn get_public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        &self.pkcs8
    }
}
