//! Error handling for the blockchain
//!
//! This module provides the error types shared by every component of the
//! node, from the crypto primitives up to the HTTP endpoints.

use std::fmt;

/// Result type alias for blockchain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for blockchain operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Cryptographic operation errors
    Crypto(String),
    /// Network communication errors
    Network(String),
    /// Transaction validation errors
    Transaction(String),
    /// Block validation errors
    InvalidBlock(String),
    /// Mining errors
    Mining(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Chain file exists but cannot be used
    Storage(String),
    /// Chain file does not exist; callers branch on this to create a genesis
    NotFound(String),
    /// Wallet/key-file operation errors
    Wallet(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors other than a missing chain file
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Storage(msg) => write!(f, "Storage error: {msg}"),
            BlockchainError::NotFound(msg) => write!(f, "Not found: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            BlockchainError::NotFound(err.to_string())
        } else {
            BlockchainError::Io(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for BlockchainError {
    fn from(err: reqwest::Error) -> Self {
        BlockchainError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no chain file");
        match BlockchainError::from(err) {
            BlockchainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other}"),
        }
    }

    #[test]
    fn test_other_io_errors_stay_io() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        match BlockchainError::from(err) {
            BlockchainError::Io(_) => {}
            other => panic!("expected Io, got {other}"),
        }
    }
}
