//! # minichain
//!
//! A minimal permissionless blockchain node: a replicated append-only
//! chain secured by a fixed-prefix proof-of-work, signed account-model
//! value transfers admitted into a pending pool, mining with a coinbase
//! reward, and longest-valid-chain convergence with peers at startup.
//!
//! ## Layout
//! - `core/`: transactions, blocks, merkle root, proof-of-work and the
//!   blockchain container with its derived balance ledger
//! - `storage/`: the single-file JSON chain snapshot and the mempool
//! - `network/`: HTTP endpoints, peer broadcast, startup sync, nicknames
//! - `wallet/`: ECDSA key pairs, key files, address derivation
//! - `utils/`: crypto primitives shared by everything above
//! - `config/`, `cli/`: startup configuration and argument parsing

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use cli::{NodeOpt, WalletCommand, WalletOpt};
pub use config::Config;
pub use core::{Block, BlockHeader, Blockchain, ProofOfWork, Transaction, COINBASE_SENDER};
pub use error::{BlockchainError, Result};
pub use network::{Node, PeerServer, BLOCK_REWARD, MAX_TX_PER_BLOCK};
pub use storage::{FileStorage, Mempool};
pub use wallet::Wallet;
