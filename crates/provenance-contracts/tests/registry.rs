//! Registry resolution against the development chain and file-backed records

use provenance_contracts::catalog::{
    DATA_ANALYSTS_NFTS, DATA_PROVIDERS_NFTS, SCHRODINGER_PROTOCOL, VERIFIER_PROVENANCE,
};
use provenance_contracts::*;
use provenance_core::{Address, StatementPurpose};
use serde_json::json;
use std::sync::Arc;

fn registry_with(
    config: RegistryConfig,
    chain: Arc<DevChain>,
    store: Arc<dyn DeploymentStore>,
) -> ContractRegistry {
    ContractRegistry::new(config, ContractCatalog::standard().unwrap(), chain, store).unwrap()
}

#[tokio::test]
async fn test_dependencies_resolved_before_dependents() {
    let chain = Arc::new(DevChain::new());
    let registry = registry_with(
        RegistryConfig::ephemeral("development"),
        chain.clone(),
        Arc::new(MemoryDeploymentStore::new()),
    );
    registry.initialize().await.unwrap();

    for spec in registry.catalog().specs() {
        let binding = registry.resolve(&spec.logical_name).unwrap();
        for (dep, address) in &binding.dependencies {
            assert_eq!(registry.resolve(dep).unwrap().address, *address);
        }
    }

    // Constructor arguments are the dependency addresses in order
    let protocol = registry.resolve(SCHRODINGER_PROTOCOL).unwrap();
    let stored = registry
        .call(SCHRODINGER_PROTOCOL, methods::DEPENDENCIES, vec![])
        .await
        .unwrap();
    let expected: Vec<_> = protocol.dependencies.iter().map(|(_, a)| json!(a)).collect();
    assert_eq!(stored, json!(expected));
    assert_eq!(chain.contract_count(), 4);
}

#[tokio::test]
async fn test_deploy_records_and_persisted_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployed-addresses.json");
    let chain = Arc::new(DevChain::with_network("sepolia"));

    let deployer = registry_with(
        RegistryConfig {
            network: "sepolia".into(),
            mode: ResolutionMode::Deploy,
        },
        chain.clone(),
        Arc::new(JsonFileStore::new(&path)),
    );
    deployer.initialize().await.unwrap();

    let loader = registry_with(
        RegistryConfig::persisted("sepolia"),
        chain.clone(),
        Arc::new(JsonFileStore::new(&path)),
    );
    loader.initialize().await.unwrap();

    assert!(loader.is_resolved());
    assert_eq!(loader.addresses(), deployer.addresses());
    // Loading never deploys
    assert_eq!(chain.contract_count(), 4);

    let verifier = loader
        .verifier_for(StatementPurpose::ProofOfProvenance)
        .unwrap();
    assert_eq!(verifier.network, "sepolia");
    assert_eq!(verifier.logical_name, VERIFIER_PROVENANCE);
}

#[tokio::test]
async fn test_missing_network_record() {
    let registry = registry_with(
        RegistryConfig::persisted("sepolia"),
        Arc::new(DevChain::with_network("sepolia")),
        Arc::new(MemoryDeploymentStore::new()),
    );

    let err = registry.initialize().await.unwrap_err();
    assert!(matches!(err, ContractError::MissingDeployment { ref network } if network == "sepolia"));
    assert!(err.is_startup_fatal());
}

#[tokio::test]
async fn test_missing_contract_names_exactly_that_contract() {
    let mut record = DeploymentRecord::new();
    record.insert("sepolia", DATA_PROVIDERS_NFTS, Address::new([1; 20]));
    record.insert("sepolia", VERIFIER_PROVENANCE, Address::new([3; 20]));
    record.insert("sepolia", SCHRODINGER_PROTOCOL, Address::new([4; 20]));

    let registry = registry_with(
        RegistryConfig::persisted("sepolia"),
        Arc::new(DevChain::with_network("sepolia")),
        Arc::new(MemoryDeploymentStore::with_record(record)),
    );

    let err = registry.initialize().await.unwrap_err();
    match &err {
        ContractError::MissingContract { contract, network } => {
            assert_eq!(contract, DATA_ANALYSTS_NFTS);
            assert_eq!(network, "sepolia");
        }
        other => panic!("expected MissingContract, got {other:?}"),
    }
    assert!(err.is_startup_fatal());

    // Nothing was bound
    assert!(!registry.is_resolved());
    assert!(registry.addresses().is_empty());
}

#[tokio::test]
async fn test_record_for_other_network_is_kept() {
    let mut record = DeploymentRecord::new();
    record.insert("base-sepolia", DATA_PROVIDERS_NFTS, Address::new([7; 20]));
    let store = Arc::new(MemoryDeploymentStore::with_record(record));

    let registry = registry_with(
        RegistryConfig::ephemeral("development"),
        Arc::new(DevChain::new()),
        store.clone(),
    );
    registry.initialize().await.unwrap();

    let saved = store.snapshot();
    assert_eq!(
        saved.address("base-sepolia", DATA_PROVIDERS_NFTS),
        Some(Address::new([7; 20]))
    );
    assert_eq!(saved.network("development").map(|n| n.len()), Some(4));
}
