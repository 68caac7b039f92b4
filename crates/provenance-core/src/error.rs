//! Error types for the provenance core

use thiserror::Error;

/// Result type alias using ProvenanceError
pub type Result<T> = std::result::Result<T, ProvenanceError>;

/// Errors that can occur while encoding, proving or signing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceError {
    /// Request material is missing a field or is not valid hex
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Proof generation was requested before circuit artifacts were loaded
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The proving procedure rejected the witness
    #[error("Proving failed: {0}")]
    Proving(String),

    /// No artifacts are available for the named circuit
    #[error("Unknown circuit: {0}")]
    UnknownCircuit(String),

    /// Key material could not be used
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProvenanceError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ProvenanceError::MalformedInput(msg.into())
    }
}

impl From<k256::ecdsa::Error> for ProvenanceError {
    fn from(err: k256::ecdsa::Error) -> Self {
        ProvenanceError::CryptoError(err.to_string())
    }
}

impl From<serde_json::Error> for ProvenanceError {
    fn from(err: serde_json::Error) -> Self {
        ProvenanceError::SerializationError(err.to_string())
    }
}

impl From<hex::FromHexError> for ProvenanceError {
    fn from(err: hex::FromHexError) -> Self {
        ProvenanceError::MalformedInput(format!("invalid hex: {}", err))
    }
}
