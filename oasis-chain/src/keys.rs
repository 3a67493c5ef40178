//! secp256k1 key material and signature helpers for stake blocks.
//!
//! Stake-block signatures come in two historical encodings: a 65-byte
//! recoverable compact signature with the Bitcoin `27 + recovery_id` header
//! byte, and a plain 64-byte compact ECDSA signature. Both sign the raw
//! 32-byte block hash.

use std::{collections::HashMap, fmt};

use lazy_static::lazy_static;
use ripemd::Ripemd160;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId, Signature},
    All, Message, Secp256k1,
};
use sha2::{Digest, Sha256};

pub use secp256k1::SecretKey;

lazy_static! {
    static ref SECP256K1: Secp256k1<All> = Secp256k1::new();
}

/// A compressed secp256k1 public key.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// Derive the public key for a secret key.
    pub fn from_secret_key(key: &SecretKey) -> Self {
        PublicKey(secp256k1::PublicKey::from_secret_key(&SECP256K1, key))
    }

    /// Parse a serialized public key (compressed or uncompressed encoding).
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        secp256k1::PublicKey::from_slice(bytes).ok().map(PublicKey)
    }

    /// The 33-byte compressed encoding of this key.
    pub fn serialize(&self) -> [u8; 33] {
        self.0.serialize()
    }

    /// The hash160 key id of the compressed encoding.
    pub fn key_id(&self) -> KeyId {
        KeyId(hash160(&self.serialize()))
    }

    /// Verify a plain 64-byte compact ECDSA signature over `digest`.
    ///
    /// Any malformed signature yields `false`, never an error: this runs on
    /// the consensus path against attacker-supplied bytes.
    pub fn verify(&self, digest: [u8; 32], signature: &[u8]) -> bool {
        let signature = match Signature::from_compact(signature) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        SECP256K1
            .verify_ecdsa(&Message::from_digest(digest), &signature, &self.0)
            .is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&hex::encode(self.serialize()))
            .finish()
    }
}

/// A hash160 (SHA-256 then RIPEMD-160) identifier of a public key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KeyId(pub [u8; 20]);

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("KeyId").field(&hex::encode(self.0)).finish()
    }
}

/// Compute the Bitcoin hash160 of `data`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Ripemd160::digest(sha));
    hash
}

/// Sign `digest` with a plain compact ECDSA signature.
pub fn sign_compact(digest: [u8; 32], key: &SecretKey) -> [u8; 64] {
    SECP256K1
        .sign_ecdsa(&Message::from_digest(digest), key)
        .serialize_compact()
}

/// Sign `digest` with a recoverable compact signature.
///
/// The result is 65 bytes: the `27 + recovery_id + 4` header byte used for
/// compressed keys, then the 64-byte compact signature.
pub fn sign_recoverable(digest: [u8; 32], key: &SecretKey) -> [u8; 65] {
    let signature = SECP256K1.sign_ecdsa_recoverable(&Message::from_digest(digest), key);
    let (recovery_id, bytes) = signature.serialize_compact();

    let mut out = [0u8; 65];
    out[0] = 27 + recovery_id.to_i32() as u8 + 4;
    out[1..].copy_from_slice(&bytes);
    out
}

/// Recover the public key from a 65-byte recoverable compact signature over
/// `digest`.
///
/// Returns `None` for any malformed signature: wrong length, out-of-range
/// header byte, or a signature that does not recover to a valid key.
pub fn recover(digest: [u8; 32], signature: &[u8]) -> Option<PublicKey> {
    if signature.len() != 65 {
        return None;
    }
    let header = signature[0];
    if !(27..=34).contains(&header) {
        return None;
    }

    let recovery_id = RecoveryId::from_i32(((header - 27) & 0x03) as i32).ok()?;
    let signature = RecoverableSignature::from_compact(&signature[1..], recovery_id).ok()?;

    SECP256K1
        .recover_ecdsa(&Message::from_digest(digest), &signature)
        .ok()
        .map(PublicKey)
}

/// An external store of staking keys, indexed by key id.
///
/// The wallet provides the production implementation; the in-memory map
/// implementation below serves the staking loop's tests.
pub trait KeyStore {
    /// Look up the secret key for `key_id`.
    fn get_key(&self, key_id: &KeyId) -> Option<SecretKey>;
}

impl KeyStore for HashMap<KeyId, SecretKey> {
    fn get_key(&self, key_id: &KeyId) -> Option<SecretKey> {
        self.get(key_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(last_byte: u8) -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = last_byte;
        SecretKey::from_slice(&bytes).expect("hard-coded test key is valid")
    }

    #[test]
    fn recoverable_signature_roundtrip() {
        let _init_guard = oasis_test::init();

        let key = test_key(7);
        let digest = [0x42; 32];

        let signature = sign_recoverable(digest, &key);
        let recovered = recover(digest, &signature).expect("fresh signature recovers");
        assert_eq!(recovered, PublicKey::from_secret_key(&key));

        // A different digest recovers a different key (or nothing).
        let other = recover([0x43; 32], &signature);
        assert_ne!(other, Some(PublicKey::from_secret_key(&key)));
    }

    #[test]
    fn truncated_recoverable_signature_is_rejected() {
        let _init_guard = oasis_test::init();

        let key = test_key(9);
        let digest = [0x42; 32];
        let signature = sign_recoverable(digest, &key);

        assert!(recover(digest, &signature[..64]).is_none());
        assert!(recover(digest, &[]).is_none());
    }

    #[test]
    fn compact_signature_verifies() {
        let _init_guard = oasis_test::init();

        let key = test_key(11);
        let public = PublicKey::from_secret_key(&key);
        let digest = [0x24; 32];

        let signature = sign_compact(digest, &key);
        assert!(public.verify(digest, &signature));
        assert!(!public.verify([0x25; 32], &signature));
        assert!(!public.verify(digest, &signature[..63]));
    }

    #[test]
    fn key_store_lookup() {
        let _init_guard = oasis_test::init();

        let key = test_key(13);
        let key_id = PublicKey::from_secret_key(&key).key_id();

        let mut store = HashMap::new();
        store.insert(key_id, key);

        assert_eq!(store.get_key(&key_id), Some(key));
        assert_eq!(store.get_key(&KeyId([0; 20])), None);
    }
}
