//! Shared application state and startup ordering

use chrono::{DateTime, Utc};
use provenance_contracts::{ChainClient, ContractCatalog, ContractRegistry, DeploymentStore};
use provenance_core::{KeyPair, ProvingBackend};
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::core::{AccessPolicyManager, DataRegistry, ProofGenerator, ProofVerifier, Result};
use crate::keys::KeyRegistry;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServiceConfig,
    pub contracts: Arc<ContractRegistry>,
    pub generator: ProofGenerator,
    pub verifier: ProofVerifier,
    pub access: Arc<AccessPolicyManager>,
    pub data: DataRegistry,
    pub keys: KeyRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Resolve every contract, then assemble the components on top of them.
    ///
    /// Circuit artifacts are not loaded yet; see [`AppState::load_circuits`].
    pub async fn initialize(
        config: ServiceConfig,
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn DeploymentStore>,
        backend: Arc<dyn ProvingBackend>,
        accounts: Vec<KeyPair>,
    ) -> Result<Self> {
        let contracts = ContractRegistry::new(
            config.registry_config(),
            ContractCatalog::standard()?,
            chain,
            store,
        )?;
        contracts.initialize().await?;
        let contracts = Arc::new(contracts);

        let access = Arc::new(AccessPolicyManager::new(contracts.clone()));
        Ok(Self {
            generator: ProofGenerator::new(backend),
            verifier: ProofVerifier::new(contracts.clone()),
            data: DataRegistry::new(contracts.clone(), access.clone()),
            keys: KeyRegistry::new(config.environment, contracts.clone(), accounts),
            access,
            contracts,
            config,
            started_at: Utc::now(),
        })
    }

    /// Load the artifacts of every circuit the verifier contracts reference
    pub async fn load_circuits(&self) -> Result<()> {
        self.generator
            .load_circuits(&self.contracts.circuit_names())
            .await
    }

    /// Whether proof generation is available
    pub fn is_ready(&self) -> bool {
        self.contracts.is_resolved() && self.generator.is_ready()
    }
}
