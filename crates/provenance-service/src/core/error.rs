//! Service error type

use provenance_contracts::ContractError;
use provenance_core::{Address, ProvenanceError, Role};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The on-chain verification call itself failed
    #[error("Verification call failed: {0}")]
    VerificationCall(String),

    /// A request signature is missing its mark: wrong key, wrong intent or stale
    #[error("Invalid request signature: {0}")]
    InvalidSignature(String),

    /// Access policies are self-service
    #[error("{caller} may not set the access policy of {owner}")]
    UnauthorizedWrite { caller: Address, owner: Address },

    #[error("{address} does not hold the {role} role")]
    MissingRole { address: Address, role: Role },

    #[error("{requester} may not read the data of {owner}")]
    AccessDenied { owner: Address, requester: Address },

    #[error("{0} is only available in development mode")]
    ForbiddenInProduction(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unknown signing account {0}")]
    UnknownAccount(Address),
}
