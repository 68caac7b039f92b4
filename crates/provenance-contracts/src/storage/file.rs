//! JSON file deployment store
//!
//! The file holds a pretty-printed object of
//! `{ network: { logical name: "0x..." } }`. A missing file is an empty record.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{DeploymentRecord, DeploymentStore, NetworkDeployments, StorageError};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<DeploymentRecord, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No deployment record yet");
                Ok(DeploymentRecord::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DeploymentStore for JsonFileStore {
    async fn load(&self) -> Result<DeploymentRecord, StorageError> {
        self.read_record().await
    }

    async fn save_network(
        &self,
        network: &str,
        deployments: &NetworkDeployments,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.read_record().await?;
        record.set_network(network, deployments.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut json = serde_json::to_vec_pretty(&record)?;
        json.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(
            path = %self.path.display(),
            network = %network,
            contracts = deployments.len(),
            "Saved deployed addresses"
        );
        Ok(())
    }
}
