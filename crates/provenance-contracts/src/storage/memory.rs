//! In-memory deployment store
//!
//! Data is lost on restart.

use async_trait::async_trait;
use std::sync::RwLock;
use tracing::debug;

use super::{DeploymentRecord, DeploymentStore, NetworkDeployments, StorageError};

#[derive(Debug, Default)]
pub struct MemoryDeploymentStore {
    record: RwLock<DeploymentRecord>,
}

impl MemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_record(record: DeploymentRecord) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }

    /// Copy of the current record
    pub fn snapshot(&self) -> DeploymentRecord {
        self.record
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DeploymentStore for MemoryDeploymentStore {
    async fn load(&self) -> Result<DeploymentRecord, StorageError> {
        Ok(self.snapshot())
    }

    async fn save_network(
        &self,
        network: &str,
        deployments: &NetworkDeployments,
    ) -> Result<(), StorageError> {
        let mut record = self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(network = %network, contracts = deployments.len(), "Saving deployments");
        record.set_network(network, deployments.clone());
        Ok(())
    }
}
