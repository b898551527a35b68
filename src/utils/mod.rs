//! Utility functions and helpers
//!
//! Cryptographic primitives, hex encoding and the wall-clock helper used
//! throughout the blockchain.

pub mod crypto;

pub use crypto::{
    current_timestamp, ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, new_key_pair,
    pub_key_to_address, public_key_from_pkcs8, sha256_digest, to_hex,
};
