//! Contract registry
//!
//! Resolves logical contract names to callable bindings on one named
//! network. On an ephemeral network every contract is deployed at startup in
//! dependency order; on a persisted network the addresses come from the
//! deployment record and every contract must be present before the registry
//! reports itself resolved. Bindings are created once and never re-resolved.

use provenance_core::{Address, StatementPurpose};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info};

use crate::catalog::{ContractCatalog, ContractSpec, VerifierSpec};
use crate::chain::{ChainClient, ContractInterface, Receipt};
use crate::error::{ContractError, Result};
use crate::storage::{DeploymentStore, NetworkDeployments};

/// How the registry obtains addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Deploy every contract and record the addresses
    Deploy,
    /// Load addresses from the deployment record
    LoadRecorded,
}

/// Explicit registry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub network: String,
    pub mode: ResolutionMode,
}

impl RegistryConfig {
    /// Fresh deploys every run
    pub fn ephemeral(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            mode: ResolutionMode::Deploy,
        }
    }

    /// Addresses loaded from the deployment record
    pub fn persisted(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            mode: ResolutionMode::LoadRecorded,
        }
    }
}

/// A resolved, callable contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    pub logical_name: String,
    pub network: String,
    pub address: Address,
    pub interface: ContractInterface,
    /// Resolved dependencies in constructor-argument order
    pub dependencies: Vec<(String, Address)>,
    /// Circuit and statement purpose, for verifier contracts
    pub verifier: Option<VerifierSpec>,
}

impl ContractBinding {
    pub fn is_verifier(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn circuit_name(&self) -> Option<&str> {
        self.verifier.as_ref().map(|v| v.circuit_name.as_str())
    }

    pub fn purpose(&self) -> Option<StatementPurpose> {
        self.verifier.as_ref().map(|v| v.purpose)
    }
}

pub struct ContractRegistry {
    config: RegistryConfig,
    catalog: ContractCatalog,
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn DeploymentStore>,
    bindings: RwLock<HashMap<String, Arc<ContractBinding>>>,
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("config", &self.config)
            .field("bound", &self.read().len())
            .finish()
    }
}

impl ContractRegistry {
    pub fn new(
        config: RegistryConfig,
        catalog: ContractCatalog,
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn DeploymentStore>,
    ) -> Result<Self> {
        if chain.network() != config.network {
            return Err(ContractError::NetworkMismatch {
                expected: config.network.clone(),
                actual: chain.network().to_string(),
            });
        }

        Ok(Self {
            config,
            catalog,
            chain,
            store,
            bindings: RwLock::new(HashMap::new()),
        })
    }

    pub fn network(&self) -> &str {
        &self.config.network
    }

    pub fn mode(&self) -> ResolutionMode {
        self.config.mode
    }

    pub fn catalog(&self) -> &ContractCatalog {
        &self.catalog
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Resolve every catalog contract.
    ///
    /// Any error leaves the registry unresolved and must stop startup.
    pub async fn initialize(&self) -> Result<()> {
        let result = match self.config.mode {
            ResolutionMode::Deploy => self.deploy_all().await,
            ResolutionMode::LoadRecorded => self.load_all().await,
        };

        match &result {
            Ok(()) => info!(
                network = %self.config.network,
                contracts = self.catalog.len(),
                "All contracts resolved"
            ),
            Err(e) => error!(network = %self.config.network, error = %e, "Contract resolution failed"),
        }
        result
    }

    async fn deploy_all(&self) -> Result<()> {
        for spec in self.catalog.deployment_order() {
            self.deploy(&spec.logical_name, Vec::new()).await?;
        }

        self.store
            .save_network(&self.config.network, &self.addresses())
            .await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<()> {
        let record = self.store.load().await?;
        let deployed = record
            .network(&self.config.network)
            .ok_or_else(|| ContractError::MissingDeployment {
                network: self.config.network.clone(),
            })?;

        // All or nothing: check the whole record before binding anything
        let mut addresses = Vec::with_capacity(self.catalog.len());
        for spec in self.catalog.deployment_order() {
            let address = deployed.get(&spec.logical_name).copied().ok_or_else(|| {
                ContractError::MissingContract {
                    contract: spec.logical_name.clone(),
                    network: self.config.network.clone(),
                }
            })?;
            addresses.push((spec.logical_name.as_str(), address));
        }

        for (name, address) in addresses {
            self.load_deployed(name, address)?;
        }
        Ok(())
    }

    /// Deploy one logical contract and bind it.
    ///
    /// Constructor arguments are the resolved dependency addresses, in
    /// catalog order, followed by `extra_args`.
    pub async fn deploy(
        &self,
        logical_name: &str,
        extra_args: Vec<Value>,
    ) -> Result<Arc<ContractBinding>> {
        let spec = self.spec(logical_name)?;
        self.ensure_unbound(logical_name)?;
        let dependencies = self.dependency_addresses(spec)?;

        let mut constructor_args: Vec<Value> =
            dependencies.iter().map(|(_, address)| json!(address)).collect();
        constructor_args.extend(extra_args);

        let address = self.chain.deploy(&spec.artifact, constructor_args).await?;
        info!(
            contract = %logical_name,
            network = %self.config.network,
            address = %address,
            "Deployed contract"
        );

        self.bind(spec, address, dependencies)
    }

    /// Bind a logical contract to an already deployed address
    pub fn load_deployed(&self, logical_name: &str, address: Address) -> Result<Arc<ContractBinding>> {
        let spec = self.spec(logical_name)?;
        self.ensure_unbound(logical_name)?;
        let dependencies = self.dependency_addresses(spec)?;

        info!(
            contract = %logical_name,
            network = %self.config.network,
            address = %address,
            "Loaded deployed contract"
        );
        self.bind(spec, address, dependencies)
    }

    /// Cached binding for a logical contract
    pub fn resolve(&self, logical_name: &str) -> Result<Arc<ContractBinding>> {
        if let Some(binding) = self.read().get(logical_name) {
            return Ok(binding.clone());
        }

        self.spec(logical_name)?;
        Err(ContractError::MissingContract {
            contract: logical_name.to_string(),
            network: self.config.network.clone(),
        })
    }

    /// Whether every catalog contract is bound
    pub fn is_resolved(&self) -> bool {
        let bindings = self.read();
        self.catalog
            .specs()
            .iter()
            .all(|s| bindings.contains_key(&s.logical_name))
    }

    /// Verifier binding serving a statement purpose
    pub fn verifier_for(&self, purpose: StatementPurpose) -> Result<Arc<ContractBinding>> {
        self.verifiers()
            .into_iter()
            .find(|b| b.purpose() == Some(purpose))
            .ok_or_else(|| ContractError::NoVerifier(purpose.to_string()))
    }

    /// Bound verifiers in catalog order
    pub fn verifiers(&self) -> Vec<Arc<ContractBinding>> {
        let bindings = self.read();
        self.catalog
            .verifiers()
            .filter_map(|(spec, _)| bindings.get(&spec.logical_name).cloned())
            .collect()
    }

    /// Circuits referenced by the catalog's verifiers, without duplicates
    pub fn circuit_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, verifier) in self.catalog.verifiers() {
            if !names.contains(&verifier.circuit_name) {
                names.push(verifier.circuit_name.clone());
            }
        }
        names
    }

    /// Bound addresses keyed by logical name
    pub fn addresses(&self) -> NetworkDeployments {
        self.read()
            .iter()
            .map(|(name, binding)| (name.clone(), binding.address))
            .collect()
    }

    /// Read-only call on a bound contract
    pub async fn call(&self, logical_name: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        let binding = self.resolve(logical_name)?;
        debug!(contract = %logical_name, method = %method, "Calling contract");
        self.chain
            .call(binding.address, &binding.interface, method, args)
            .await
    }

    /// State-changing call on a bound contract
    pub async fn send(&self, logical_name: &str, method: &str, args: Vec<Value>) -> Result<Receipt> {
        let binding = self.resolve(logical_name)?;
        debug!(contract = %logical_name, method = %method, "Sending transaction");
        self.chain
            .send(binding.address, &binding.interface, method, args)
            .await
    }

    fn spec(&self, logical_name: &str) -> Result<&ContractSpec> {
        self.catalog
            .get(logical_name)
            .ok_or_else(|| ContractError::UnknownContract(logical_name.to_string()))
    }

    fn ensure_unbound(&self, logical_name: &str) -> Result<()> {
        if self.read().contains_key(logical_name) {
            return Err(ContractError::DuplicateDeployment(logical_name.to_string()));
        }
        Ok(())
    }

    fn dependency_addresses(&self, spec: &ContractSpec) -> Result<Vec<(String, Address)>> {
        let bindings = self.read();
        spec.dependencies
            .iter()
            .map(|dep| {
                bindings
                    .get(dep)
                    .map(|b| (dep.clone(), b.address))
                    .ok_or_else(|| ContractError::UnresolvedDependency {
                        contract: spec.logical_name.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect()
    }

    fn bind(
        &self,
        spec: &ContractSpec,
        address: Address,
        dependencies: Vec<(String, Address)>,
    ) -> Result<Arc<ContractBinding>> {
        let binding = Arc::new(ContractBinding {
            logical_name: spec.logical_name.clone(),
            network: self.config.network.clone(),
            address,
            interface: spec.artifact.interface(),
            dependencies,
            verifier: spec.verifier.clone(),
        });

        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A concurrent deploy may have bound the name while we awaited the chain
        if bindings.contains_key(&spec.logical_name) {
            return Err(ContractError::DuplicateDeployment(spec.logical_name.clone()));
        }
        bindings.insert(spec.logical_name.clone(), binding.clone());
        Ok(binding)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ContractBinding>>> {
        self.bindings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DATA_ANALYSTS_NFTS, DATA_PROVIDERS_NFTS, SCHRODINGER_PROTOCOL, VERIFIER_PROVENANCE};
    use crate::chain::methods;
    use crate::devnet::DevChain;
    use crate::storage::MemoryDeploymentStore;

    fn registry(config: RegistryConfig) -> ContractRegistry {
        ContractRegistry::new(
            config,
            ContractCatalog::standard().unwrap(),
            Arc::new(DevChain::new()),
            Arc::new(MemoryDeploymentStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_deploy_requires_dependencies() {
        let registry = registry(RegistryConfig::ephemeral("development"));

        let err = registry.deploy(DATA_ANALYSTS_NFTS, vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::UnresolvedDependency { ref dependency, .. } if dependency == DATA_PROVIDERS_NFTS
        ));

        registry.deploy(DATA_PROVIDERS_NFTS, vec![]).await.unwrap();
        let analysts = registry.deploy(DATA_ANALYSTS_NFTS, vec![]).await.unwrap();
        assert_eq!(analysts.dependencies.len(), 1);
        assert_eq!(analysts.dependencies[0].0, DATA_PROVIDERS_NFTS);
    }

    #[tokio::test]
    async fn test_constructor_args_follow_bound_dependencies() {
        let registry = registry(RegistryConfig::ephemeral("development"));
        for spec in registry.catalog().deployment_order() {
            if spec.logical_name != SCHRODINGER_PROTOCOL {
                registry.deploy(&spec.logical_name, vec![]).await.unwrap();
            }
        }

        let protocol = registry
            .deploy(SCHRODINGER_PROTOCOL, vec![json!("v1")])
            .await
            .unwrap();
        assert!(!protocol.dependencies.is_empty());

        let stored = registry
            .call(SCHRODINGER_PROTOCOL, methods::DEPENDENCIES, vec![])
            .await
            .unwrap();
        let mut expected: Vec<Value> = protocol
            .dependencies
            .iter()
            .map(|(_, address)| json!(address))
            .collect();
        expected.push(json!("v1"));
        assert_eq!(stored, Value::Array(expected));
    }

    #[tokio::test]
    async fn test_duplicate_deploy() {
        let registry = registry(RegistryConfig::ephemeral("development"));
        registry.deploy(DATA_PROVIDERS_NFTS, vec![]).await.unwrap();

        let err = registry.deploy(DATA_PROVIDERS_NFTS, vec![]).await.unwrap_err();
        assert!(matches!(err, ContractError::DuplicateDeployment(name) if name == DATA_PROVIDERS_NFTS));

        let err = registry
            .load_deployed(DATA_PROVIDERS_NFTS, Address::new([1; 20]))
            .unwrap_err();
        assert!(matches!(err, ContractError::DuplicateDeployment(_)));
    }

    #[tokio::test]
    async fn test_initialize_binds_everything() {
        let registry = registry(RegistryConfig::ephemeral("development"));
        assert!(!registry.is_resolved());

        registry.initialize().await.unwrap();
        assert!(registry.is_resolved());

        let protocol = registry.resolve(SCHRODINGER_PROTOCOL).unwrap();
        let deps: Vec<&str> = protocol.dependencies.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(deps, vec![DATA_PROVIDERS_NFTS, DATA_ANALYSTS_NFTS, VERIFIER_PROVENANCE]);

        let verifier = registry
            .verifier_for(StatementPurpose::ProofOfProvenance)
            .unwrap();
        assert_eq!(verifier.logical_name, VERIFIER_PROVENANCE);
        assert_eq!(verifier.circuit_name(), Some("schnorr"));
        assert_eq!(registry.circuit_names(), vec!["schnorr".to_string()]);
    }

    #[test]
    fn test_resolve_unknown_and_unbound() {
        let registry = registry(RegistryConfig::persisted("development"));

        assert!(matches!(
            registry.resolve("Nope"),
            Err(ContractError::UnknownContract(_))
        ));
        assert!(matches!(
            registry.resolve(DATA_PROVIDERS_NFTS),
            Err(ContractError::MissingContract { .. })
        ));
    }

    #[test]
    fn test_network_mismatch() {
        let err = ContractRegistry::new(
            RegistryConfig::persisted("sepolia"),
            ContractCatalog::standard().unwrap(),
            Arc::new(DevChain::new()),
            Arc::new(MemoryDeploymentStore::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::NetworkMismatch { .. }));
    }
}
