//! Contract Resolution
//!
//! Resolves the service's logical contracts (authorization tokens, proof
//! verifiers, the protocol contract) to live bindings on a named network.
//!
//! ## Architecture
//!
//! - **Catalog**: logical names, artifacts, and the dependency graph between
//!   contracts, resolved in topological order
//! - **Chain client**: the deploy/call/send collaborator; [`DevChain`] is the
//!   in-process ephemeral network, [`HttpChainClient`] forwards to a gateway
//! - **Deployment store**: where persisted networks record their addresses
//! - **Registry**: deploys or loads every contract once per process and
//!   caches the bindings
//!
//! ## Usage
//!
//! ```ignore
//! use provenance_contracts::*;
//!
//! let registry = ContractRegistry::new(
//!     RegistryConfig::persisted("sepolia"),
//!     ContractCatalog::standard()?,
//!     Arc::new(HttpChainClient::new("sepolia", gateway_url)),
//!     Arc::new(JsonFileStore::new("build/deployed-addresses.json")),
//! )?;
//! registry.initialize().await?;
//!
//! let verifier = registry.verifier_for(StatementPurpose::ProofOfProvenance)?;
//! ```

pub mod catalog;
pub mod chain;
pub mod devnet;
pub mod error;
pub mod http;
pub mod network;
pub mod registry;
pub mod storage;

pub use catalog::{ContractCatalog, ContractSpec, VerifierSpec};
pub use chain::{methods, ChainClient, ContractArtifact, ContractInterface, ContractKind, MethodDescriptor, Receipt};
pub use devnet::DevChain;
pub use error::{ContractError, Result};
pub use http::HttpChainClient;
pub use network::NetworkInfo;
pub use registry::{ContractBinding, ContractRegistry, RegistryConfig, ResolutionMode};
pub use storage::{
    DeploymentRecord, DeploymentStore, JsonFileStore, MemoryDeploymentStore, NetworkDeployments,
    StorageError,
};
