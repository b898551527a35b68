//! Command-line argument definitions for the `node` and `wallet` binaries.

pub mod commands;

pub use commands::{NodeOpt, WalletCommand, WalletOpt};
