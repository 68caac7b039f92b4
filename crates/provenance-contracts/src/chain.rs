//! Chain collaborator interface
//!
//! The registry never talks to a transport directly; it deploys, calls and
//! sends through a [`ChainClient`] chosen for the target network.

use async_trait::async_trait;
use provenance_core::{Address, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Method names exposed by the catalog's contracts
pub mod methods {
    pub const MINT: &str = "mint";
    pub const TOKEN_OF: &str = "tokenOf";
    pub const TOTAL_SUPPLY: &str = "totalSupply";
    pub const VERIFY_PROOF: &str = "verifyProof";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const SET_ACCESS_POLICY: &str = "setAccessPolicy";
    pub const GET_ACCESS_POLICY: &str = "getAccessPolicy";
    pub const GET_ALL_ACCESS_POLICIES: &str = "getAllAccessPolicies";
    pub const SET_PUBLIC_KEY: &str = "setPublicKey";
    pub const GET_PUBLIC_KEY: &str = "getPublicKey";
    pub const RESET_PUBLIC_KEYS: &str = "resetPublicKeys";
    pub const SET_DATA: &str = "setData";
    pub const GET_DATA: &str = "getData";
    pub const UPLOAD_SIGNATURE: &str = "uploadSignature";
    pub const GET_SIGNATURES: &str = "getSignatures";
}

/// What a contract artifact implements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractKind {
    /// One authorization token per address for a role
    RoleToken { role: Role },
    /// Checks proofs of one circuit
    Verifier { circuit_name: String },
    /// Access policies, public keys, data records and signature log
    Protocol,
}

impl ContractKind {
    /// Interface descriptor for contracts of this kind
    pub fn interface(&self, contract: &str) -> ContractInterface {
        use methods::*;

        let methods = match self {
            ContractKind::RoleToken { .. } => vec![
                MethodDescriptor::mutating(MINT),
                MethodDescriptor::view(TOKEN_OF),
                MethodDescriptor::view(TOTAL_SUPPLY),
            ],
            ContractKind::Verifier { .. } => vec![MethodDescriptor::view(VERIFY_PROOF)],
            ContractKind::Protocol => vec![
                MethodDescriptor::view(DEPENDENCIES),
                MethodDescriptor::mutating(SET_ACCESS_POLICY),
                MethodDescriptor::view(GET_ACCESS_POLICY),
                MethodDescriptor::view(GET_ALL_ACCESS_POLICIES),
                MethodDescriptor::mutating(SET_PUBLIC_KEY),
                MethodDescriptor::view(GET_PUBLIC_KEY),
                MethodDescriptor::mutating(RESET_PUBLIC_KEYS),
                MethodDescriptor::mutating(SET_DATA),
                MethodDescriptor::view(GET_DATA),
                MethodDescriptor::mutating(UPLOAD_SIGNATURE),
                MethodDescriptor::view(GET_SIGNATURES),
            ],
        };

        ContractInterface {
            contract: contract.to_string(),
            methods,
        }
    }
}

/// Deployable contract code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Contract name inside the source file
    pub contract: String,
    /// Source file the artifact was compiled from
    pub file: String,
    pub kind: ContractKind,
}

impl ContractArtifact {
    pub fn new(contract: impl Into<String>, file: impl Into<String>, kind: ContractKind) -> Self {
        Self {
            contract: contract.into(),
            file: file.into(),
            kind,
        }
    }

    pub fn interface(&self) -> ContractInterface {
        self.kind.interface(&self.contract)
    }
}

/// One callable method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// Whether the method changes contract state (requires `send`)
    pub mutates: bool,
}

impl MethodDescriptor {
    pub fn view(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mutates: false,
        }
    }

    pub fn mutating(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mutates: true,
        }
    }
}

/// Interface descriptor of a deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInterface {
    pub contract: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ContractInterface {
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Result of a state-changing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: u64,
    /// Value returned by the method
    #[serde(default)]
    pub output: Value,
}

/// Chain collaborator for one named network
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network this client is connected to
    fn network(&self) -> &str;

    /// Deploy an artifact with constructor arguments
    async fn deploy(&self, artifact: &ContractArtifact, args: Vec<Value>) -> Result<Address>;

    /// Read-only call
    async fn call(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value>;

    /// State-changing call
    async fn send(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Receipt>;
}
