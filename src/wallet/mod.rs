//! Key management: ECDSA key pairs, key files and address derivation.

pub mod wallet;

pub use wallet::Wallet;
