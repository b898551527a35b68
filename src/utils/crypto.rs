use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING,
};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time as integer seconds since the Unix epoch.
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u64 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn to_hex(data: &[u8]) -> String {
    HEXLOWER.encode(data)
}

/// Generate a fresh ECDSA P-256 key pair, returned as a PKCS#8 document.
pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

/// Export the public key of a PKCS#8 key pair as an uncompressed P-256 point.
///
/// Every node uses this exact encoding; the bytes feed straight into
/// [`pub_key_to_address`] and into signature verification.
pub fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    Ok(key_pair.public_key().as_ref().to_vec())
}

/// Sign `message` with the private key in `pkcs8`.
///
/// The message is hashed with SHA-256 and signed with ECDSA P-256; the
/// signature is the fixed-length 64-byte `r || s` form.
pub fn ecdsa_p256_sha256_sign(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

/// Verify a signature produced by [`ecdsa_p256_sha256_sign`].
///
/// Returns false on any parse or verification failure, never an error.
pub fn ecdsa_p256_sha256_verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let peer_public_key =
        ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key);
    peer_public_key.verify(message, signature).is_ok()
}

/// Derive the account address for a public key: `hex(sha256(pub_key))`,
/// always 64 lowercase hex characters.
pub fn pub_key_to_address(pub_key: &[u8]) -> String {
    to_hex(&sha256_digest(pub_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_digest_known_vector() {
        // SHA-256("abc")
        let digest = sha256_digest(b"abc");
        assert_eq!(
            to_hex(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_from_pkcs8(&pkcs8).unwrap();
        let msg = b"pay 10 to bob";

        let sig = ecdsa_p256_sha256_sign(&pkcs8, msg).unwrap();
        assert!(ecdsa_p256_sha256_verify(&pub_key, msg, &sig));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_from_pkcs8(&pkcs8).unwrap();
        let msg = b"pay 10 to bob".to_vec();
        let sig = ecdsa_p256_sha256_sign(&pkcs8, &msg).unwrap();

        // Tampered message
        let mut bad_msg = msg.clone();
        bad_msg[0] ^= 0x01;
        assert!(!ecdsa_p256_sha256_verify(&pub_key, &bad_msg, &sig));

        // Tampered signature
        let mut bad_sig = sig.clone();
        bad_sig[10] ^= 0x01;
        assert!(!ecdsa_p256_sha256_verify(&pub_key, &msg, &bad_sig));

        // Tampered public key
        let mut bad_pub = pub_key.clone();
        bad_pub[10] ^= 0x01;
        assert!(!ecdsa_p256_sha256_verify(&bad_pub, &msg, &sig));
    }

    #[test]
    fn test_verify_garbage_inputs_return_false() {
        assert!(!ecdsa_p256_sha256_verify(b"not a key", b"msg", b"not a sig"));
        assert!(!ecdsa_p256_sha256_verify(&[], b"msg", &[]));
    }

    #[test]
    fn test_address_derivation() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_from_pkcs8(&pkcs8).unwrap();
        let addr = pub_key_to_address(&pub_key);

        assert_eq!(addr, to_hex(&sha256_digest(&pub_key)));
        assert_eq!(addr.len(), 64);
        assert!(addr.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_keys_give_distinct_addresses() {
        let a = public_key_from_pkcs8(&new_key_pair().unwrap()).unwrap();
        let b = public_key_from_pkcs8(&new_key_pair().unwrap()).unwrap();
        assert_ne!(pub_key_to_address(&a), pub_key_to_address(&b));
    }
}
