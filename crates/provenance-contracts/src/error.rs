//! Error types for contract resolution

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, ContractError>;

/// Errors that can occur while resolving or calling contracts
#[derive(Error, Debug)]
pub enum ContractError {
    /// No deployment record exists for the network
    #[error("No deployed addresses found for network {network}")]
    MissingDeployment { network: String },

    /// The deployment record lacks a required contract
    #[error("Missing deployed address for {contract} on network {network}")]
    MissingContract { contract: String, network: String },

    /// A logical contract was bound twice in one run
    #[error("Contract {0} is already bound in this run")]
    DuplicateDeployment(String),

    /// Logical name is not in the catalog
    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    /// Two catalog entries share a logical name
    #[error("Contract {0} is declared twice")]
    DuplicateContract(String),

    /// A catalog entry depends on an undeclared contract
    #[error("Contract {contract} depends on undeclared contract {dependency}")]
    UnknownDependency { contract: String, dependency: String },

    /// The catalog's dependency graph has a cycle
    #[error("Dependency cycle between contracts: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A dependency has not been bound yet
    #[error("Contract {contract} requires {dependency}, which is not resolved")]
    UnresolvedDependency { contract: String, dependency: String },

    /// No verifier binding serves the statement purpose
    #[error("No verifier contract for statement purpose {0}")]
    NoVerifier(String),

    /// Chain client targets a different network than the registry
    #[error("Chain client serves network {actual}, registry expects {expected}")]
    NetworkMismatch { expected: String, actual: String },

    /// The interface descriptor does not declare the method
    #[error("Contract {contract} has no method {method}")]
    UnknownMethod { contract: String, method: String },

    /// The contract rejected the call
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// The chain collaborator failed to carry out the call
    #[error("Chain call failed: {0}")]
    Call(String),

    /// The chain collaborator answered with something unexpected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Deployment record storage failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ContractError {
    /// Errors that must stop the service from reaching ready state
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            ContractError::MissingDeployment { .. }
                | ContractError::MissingContract { .. }
                | ContractError::DuplicateDeployment(_)
                | ContractError::DuplicateContract(_)
                | ContractError::UnknownDependency { .. }
                | ContractError::DependencyCycle(_)
                | ContractError::UnresolvedDependency { .. }
                | ContractError::NetworkMismatch { .. }
                | ContractError::Storage(_)
        )
    }
}

impl From<reqwest::Error> for ContractError {
    fn from(err: reqwest::Error) -> Self {
        ContractError::Call(err.to_string())
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        ContractError::InvalidResponse(err.to_string())
    }
}
