//! Request authentication
//!
//! Writes to an access policy and reads of another address's data must be
//! signed by the acting address. The client signs the keccak-256 digest of a
//! canonical message naming the operation, its subjects and an `issued_at`
//! unix timestamp; the signer's address is derived from the supplied public
//! key. Signatures older than [`MAX_REQUEST_AGE_SECS`] are rejected.
//!
//! Canonical messages, one field per line:
//!
//! ```text
//! provenance/set_access_policy
//! owner:<0x address>
//! policy:<compact JSON, addresses and roles sorted>
//! issued_at:<unix seconds>
//! ```
//!
//! ```text
//! provenance/get_data
//! owner:<0x address>
//! requester:<0x address>
//! issued_at:<unix seconds>
//! ```
//!
//! `POST /sign_message` with the canonical message produces a valid
//! signature for the service's own signing accounts.

use chrono::{DateTime, Utc};
use provenance_core::encoding::decode_hex_field;
use provenance_core::{keccak256, AccessPolicy, Address, KeyPair, ProvenanceError, PublicKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{Result, ServiceError};

/// How long a request signature stays valid
pub const MAX_REQUEST_AGE_SECS: i64 = 300;

/// Tolerated clock drift for timestamps in the future
pub const MAX_CLOCK_SKEW_SECS: i64 = 30;

/// Operation a request signature authorizes
#[derive(Debug, Clone, Copy)]
pub enum SignedIntent<'a> {
    SetAccessPolicy {
        owner: Address,
        policy: &'a AccessPolicy,
    },
    GetData {
        owner: Address,
        requester: Address,
    },
}

impl SignedIntent<'_> {
    /// Canonical message for this intent at `issued_at`
    pub fn message(&self, issued_at: i64) -> Result<String> {
        match self {
            SignedIntent::SetAccessPolicy { owner, policy } => {
                let policy = serde_json::to_string(policy)
                    .map_err(|e| ProvenanceError::SerializationError(e.to_string()))?;
                Ok(format!(
                    "provenance/set_access_policy\nowner:{owner}\npolicy:{policy}\nissued_at:{issued_at}"
                ))
            }
            SignedIntent::GetData { owner, requester } => Ok(format!(
                "provenance/get_data\nowner:{owner}\nrequester:{requester}\nissued_at:{issued_at}"
            )),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SignedIntent::SetAccessPolicy { .. } => "set_access_policy",
            SignedIntent::GetData { .. } => "get_data",
        }
    }
}

/// Signature of the acting address over a [`SignedIntent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSignature {
    /// 64-byte x ‖ y public key of the signer
    pub public_key: String,
    /// r ‖ s over keccak-256 of the canonical message
    pub signature: String,
    /// Unix seconds
    pub issued_at: i64,
}

impl RequestSignature {
    /// Sign `intent` with `key_pair`
    pub fn sign(key_pair: &KeyPair, intent: &SignedIntent<'_>, issued_at: i64) -> Result<Self> {
        let message = intent.message(issued_at)?;
        let (_, signature) = key_pair.sign_message(message.as_bytes())?;
        Ok(Self {
            public_key: key_pair.public_key().to_hex(),
            signature: format!("0x{}", hex::encode(signature)),
            issued_at,
        })
    }

    /// Check the signature against `intent` and return the signer's address
    pub fn verify(&self, intent: &SignedIntent<'_>, now: DateTime<Utc>) -> Result<Address> {
        let age = now.timestamp() - self.issued_at;
        if age > MAX_REQUEST_AGE_SECS {
            return Err(ServiceError::InvalidSignature(format!(
                "{} request signed {}s ago, max {}s",
                intent.name(),
                age,
                MAX_REQUEST_AGE_SECS
            )));
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(ServiceError::InvalidSignature(format!(
                "{} request is dated {}s in the future",
                intent.name(),
                -age
            )));
        }

        let public_key = PublicKey::from_hex(&self.public_key)?;
        let signature = decode_hex_field("signature", &self.signature)?;
        let digest = keccak256(intent.message(self.issued_at)?.as_bytes());

        if !public_key.verify_hash(&digest, &signature) {
            warn!(
                intent = intent.name(),
                signer = %public_key.address(),
                "Request signature verification failed"
            );
            return Err(ServiceError::InvalidSignature(format!(
                "{} signature does not match the request",
                intent.name()
            )));
        }
        Ok(public_key.address())
    }
}

/// Current time as the `issued_at` of a new request
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
