//! Signing primitives for provenance claims
//!
//! secp256k1 ECDSA over caller-supplied 32-byte hashes. Public keys travel as
//! the 64-byte uncompressed point without the SEC1 prefix (x ‖ y), which is
//! the layout the proof-of-provenance circuit splits into two coordinates.
//! Messages are hashed with keccak-256 before signing.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

use crate::encoding::decode_hex_field;
use crate::error::{ProvenanceError, Result};
use crate::types::Address;

/// keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// secp256k1 key pair for signing hashes
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address().to_string())
            .field("signing_key", &"[redacted]")
            .finish()
    }
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey {
            verifying_key: VerifyingKey::from(&signing_key),
        };
        Self {
            signing_key,
            public_key,
        }
    }

    /// Create a key pair from a 32-byte private scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let signing_key = SigningKey::from_slice(bytes)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Create a key pair from hex (`0x` optional)
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let bytes = decode_hex_field("private_key", private_key)?;
        Self::from_bytes(&bytes)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> Address {
        self.public_key.address()
    }

    /// Raw private scalar
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.private_key_bytes()))
    }

    /// Sign a 32-byte hash, returning r ‖ s
    pub fn sign_hash(&self, hash: &[u8]) -> Result<[u8; 64]> {
        if hash.len() != 32 {
            return Err(ProvenanceError::MalformedInput(format!(
                "hash must be 32 bytes, got {}",
                hash.len()
            )));
        }
        let signature: Signature = self.signing_key.sign_prehash(hash)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }

    /// Hash a message with keccak-256 and sign the digest
    pub fn sign_message(&self, message: &[u8]) -> Result<([u8; 32], [u8; 64])> {
        let hash = keccak256(message);
        let signature = self.sign_hash(&hash)?;
        Ok((hash, signature))
    }
}

/// secp256k1 public key
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl PublicKey {
    /// Create a public key from the 64-byte x ‖ y encoding
    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self> {
        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(bytes);
        let verifying_key = VerifyingKey::from_sec1_bytes(&sec1)?;
        Ok(Self { verifying_key })
    }

    /// Parse hex (`0x` optional) holding exactly 64 bytes
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = decode_hex_field("public_key", value)?;
        let bytes: [u8; 64] = bytes.try_into().map_err(|b: Vec<u8>| {
            ProvenanceError::MalformedInput(format!("public_key must be 64 bytes, got {}", b.len()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// The 64-byte x ‖ y encoding
    pub fn to_bytes(&self) -> [u8; 64] {
        let point = self.verifying_key.to_encoded_point(false);
        let mut out = [0u8; 64];
        out.copy_from_slice(&point.as_bytes()[1..]);
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Account address: trailing 20 bytes of keccak-256(x ‖ y)
    pub fn address(&self) -> Address {
        Address::from_digest(&keccak256(&self.to_bytes()))
    }

    /// Check an r ‖ s signature over a hash
    pub fn verify_hash(&self, hash: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verifying_key.verify_prehash(hash, &signature).is_ok()
    }
}
