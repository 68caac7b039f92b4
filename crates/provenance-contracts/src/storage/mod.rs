//! Deployment record storage
//!
//! Persisted networks keep a record of where each logical contract was
//! deployed. The record is a nested map `network -> logical name -> address`.
//! The file backend is used by the service; the memory backend backs tests
//! and ephemeral development runs.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryDeploymentStore;

use async_trait::async_trait;
use provenance_core::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Addresses for one network, keyed by logical contract name
pub type NetworkDeployments = BTreeMap<String, Address>;

/// Deployed addresses for every known network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentRecord {
    networks: BTreeMap<String, NetworkDeployments>,
}

impl DeploymentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses recorded for a network
    pub fn network(&self, network: &str) -> Option<&NetworkDeployments> {
        self.networks.get(network)
    }

    /// Address of one contract on a network
    pub fn address(&self, network: &str, contract: &str) -> Option<Address> {
        self.networks.get(network)?.get(contract).copied()
    }

    /// Replace everything recorded for a network
    pub fn set_network(&mut self, network: impl Into<String>, deployments: NetworkDeployments) {
        self.networks.insert(network.into(), deployments);
    }

    pub fn insert(&mut self, network: &str, contract: impl Into<String>, address: Address) {
        self.networks
            .entry(network.to_string())
            .or_default()
            .insert(contract.into(), address);
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

/// Storage backend for deployment records
///
/// Implementations must be thread-safe.
#[async_trait]
pub trait DeploymentStore: Send + Sync + Debug {
    /// Load the full record. A store with nothing saved yields an empty record.
    async fn load(&self) -> Result<DeploymentRecord, StorageError>;

    /// Replace the addresses recorded for one network, keeping the others
    async fn save_network(
        &self,
        network: &str,
        deployments: &NetworkDeployments,
    ) -> Result<(), StorageError>;
}
