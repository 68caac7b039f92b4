//! Integration Tests for the Provenance Service
//!
//! These tests drive the components the way the HTTP handlers do:
//! - Startup ordering and readiness
//! - The encode → prove → verify pipeline on the development chain
//! - Persisted-network resolution failures
//! - Authorization idempotency

use async_trait::async_trait;
use provenance_contracts::catalog::{DATA_ANALYSTS_NFTS, DATA_PROVIDERS_NFTS, SCHRODINGER_PROTOCOL, VERIFIER_PROVENANCE};
use provenance_contracts::{
    ChainClient, ContractArtifact, ContractError, ContractInterface, DeploymentRecord, DevChain,
    MemoryDeploymentStore, Receipt,
};
use provenance_core::{
    Address, CircuitHandle, CircuitInputVector, DigestProver, KeyPair, Proof, ProvenanceError,
    ProvingBackend, RawArgs, Role, StatementPurpose,
};
use provenance_service::{AppState, Environment, ServiceConfig, ServiceError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// =============================================================================
// Test Helpers
// =============================================================================

/// Proves any input vector without checking the witness
struct UncheckedProver;

#[async_trait]
impl ProvingBackend for UncheckedProver {
    fn name(&self) -> &str {
        "unchecked"
    }

    async fn load_artifacts(&self, circuit_name: &str) -> provenance_core::Result<CircuitHandle> {
        DigestProver::new().load_artifacts(circuit_name).await
    }

    async fn prove(
        &self,
        handle: &CircuitHandle,
        input: &CircuitInputVector,
    ) -> provenance_core::Result<Proof> {
        let blob = DigestProver::commitment(&handle.circuit_name, &input.public_inputs);
        Ok(Proof::new(blob.to_vec(), input.public_inputs.clone()))
    }
}

/// Development chain whose read calls can be made to fail
struct FlakyChain {
    inner: DevChain,
    failing: AtomicBool,
}

#[async_trait]
impl ChainClient for FlakyChain {
    fn network(&self) -> &str {
        self.inner.network()
    }

    async fn deploy(&self, artifact: &ContractArtifact, args: Vec<Value>) -> provenance_contracts::Result<Address> {
        self.inner.deploy(artifact, args).await
    }

    async fn call(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> provenance_contracts::Result<Value> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContractError::Call("connection reset by peer".into()));
        }
        self.inner.call(address, interface, method, args).await
    }

    async fn send(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> provenance_contracts::Result<Receipt> {
        self.inner.send(address, interface, method, args).await
    }
}

async fn dev_state_with(chain: Arc<dyn ChainClient>, backend: Arc<dyn ProvingBackend>) -> AppState {
    AppState::initialize(
        ServiceConfig::default(),
        chain,
        Arc::new(MemoryDeploymentStore::new()),
        backend,
        Vec::new(),
    )
    .await
    .expect("development startup")
}

async fn ready_state(backend: Arc<dyn ProvingBackend>) -> AppState {
    let state = dev_state_with(Arc::new(DevChain::new()), backend).await;
    state.load_circuits().await.expect("circuits load");
    state
}

fn args(value: Value) -> RawArgs {
    value.as_object().cloned().expect("object")
}

fn signed_claim(key_pair: &KeyPair, message: &str) -> RawArgs {
    let (hash, signature) = key_pair.sign_message(message.as_bytes()).unwrap();
    args(json!({
        "public_key": key_pair.public_key().to_hex(),
        "hash": format!("0x{}", hex::encode(hash)),
        "signature": format!("0x{}", hex::encode(signature)),
    }))
}

async fn prove(state: &AppState, claim: &RawArgs) -> Result<Proof, ServiceError> {
    let purpose = StatementPurpose::ProofOfProvenance;
    let binding = state.contracts.verifier_for(purpose)?;
    let input = purpose.encode(claim)?;
    state
        .generator
        .generate(binding.circuit_name().unwrap(), &input)
        .await
}

// =============================================================================
// Startup and Readiness
// =============================================================================

#[tokio::test]
async fn test_contracts_resolve_before_circuits_load() {
    let state = dev_state_with(Arc::new(DevChain::new()), Arc::new(DigestProver::new())).await;

    assert!(state.contracts.is_resolved());
    assert!(!state.generator.is_ready());
    assert!(!state.is_ready());

    let claim = signed_claim(&KeyPair::generate(), "dataset v1");
    let err = prove(&state, &claim).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Provenance(ProvenanceError::NotReady(_))
    ));

    state.load_circuits().await.unwrap();
    assert!(state.is_ready());
    assert!(prove(&state, &claim).await.is_ok());
}

#[tokio::test]
async fn test_persisted_network_missing_contract_fails_startup() {
    let mut record = DeploymentRecord::new();
    record.insert("sepolia", DATA_PROVIDERS_NFTS, Address::new([1; 20]));
    record.insert("sepolia", DATA_ANALYSTS_NFTS, Address::new([2; 20]));
    record.insert("sepolia", SCHRODINGER_PROTOCOL, Address::new([4; 20]));

    let config = ServiceConfig {
        environment: Environment::Production,
        network: "sepolia".into(),
        ..ServiceConfig::default()
    };

    let result = AppState::initialize(
        config,
        Arc::new(DevChain::with_network("sepolia")),
        Arc::new(MemoryDeploymentStore::with_record(record)),
        Arc::new(DigestProver::new()),
        Vec::new(),
    )
    .await;

    match result {
        Err(ServiceError::Contract(ContractError::MissingContract { contract, network })) => {
            assert_eq!(contract, VERIFIER_PROVENANCE);
            assert_eq!(network, "sepolia");
        }
        Err(other) => panic!("expected MissingContract, got {other:?}"),
        Ok(_) => panic!("startup must fail"),
    }
}

#[tokio::test]
async fn test_persisted_network_without_record_fails_startup() {
    let config = ServiceConfig {
        environment: Environment::Production,
        network: "base-sepolia".into(),
        ..ServiceConfig::default()
    };

    let result = AppState::initialize(
        config,
        Arc::new(DevChain::with_network("base-sepolia")),
        Arc::new(MemoryDeploymentStore::new()),
        Arc::new(DigestProver::new()),
        Vec::new(),
    )
    .await;

    assert!(matches!(
        result,
        Err(ServiceError::Contract(ContractError::MissingDeployment { .. }))
    ));
}

// =============================================================================
// Proof Pipeline
// =============================================================================

#[tokio::test]
async fn test_reference_vector_round_trip() {
    let state = ready_state(Arc::new(UncheckedProver)).await;
    let purpose = StatementPurpose::ProofOfProvenance;

    let claim = args(json!({
        "public_key": format!("0x{}", "11".repeat(64)),
        "hash": "ab34",
        "signature": format!("0x{}", "dead".repeat(32)),
    }));

    let proof = prove(&state, &claim).await.unwrap();
    let signals: Vec<Option<u8>> = proof.public_signals[2..].iter().map(|s| s.to_u8()).collect();
    assert_eq!(signals, vec![Some(171), Some(52)]);

    assert!(state.verifier.verify_public_inputs(purpose, &claim, &proof).unwrap());
    assert!(state.verifier.verify_proof(purpose, &proof).await.unwrap());

    let mut mutated = claim.clone();
    mutated.insert("hash".into(), json!("ab35"));
    assert!(!state.verifier.verify_public_inputs(purpose, &mutated, &proof).unwrap());
}

#[tokio::test]
async fn test_signed_claim_end_to_end() {
    let state = ready_state(Arc::new(DigestProver::new())).await;
    let purpose = StatementPurpose::ProofOfProvenance;
    let provider = KeyPair::generate();

    let claim = signed_claim(&provider, "s3://bucket/dataset.csv");
    let proof = prove(&state, &claim).await.unwrap();

    assert!(state.verifier.verify_public_inputs(purpose, &claim, &proof).unwrap());
    assert!(state.verifier.verify_proof(purpose, &proof).await.unwrap());
}

#[tokio::test]
async fn test_signature_from_other_key_is_proving_error() {
    let state = ready_state(Arc::new(DigestProver::new())).await;
    let claimed = KeyPair::generate();
    let actual = KeyPair::generate();

    let mut claim = signed_claim(&actual, "dataset");
    claim.insert("public_key".into(), json!(claimed.public_key().to_hex()));

    let err = prove(&state, &claim).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Provenance(ProvenanceError::Proving(_))
    ));
}

#[tokio::test]
async fn test_malformed_claim_is_rejected_before_proving() {
    let state = ready_state(Arc::new(DigestProver::new())).await;

    let claim = args(json!({ "public_key": "0x1234", "hash": "ab", "signature": "00" }));
    let err = prove(&state, &claim).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Provenance(ProvenanceError::MalformedInput(_))
    ));

    let claim = args(json!({ "public_key": format!("0x{}", "11".repeat(64)), "hash": "abc" }));
    assert!(matches!(
        prove(&state, &claim).await,
        Err(ServiceError::Provenance(ProvenanceError::MalformedInput(_)))
    ));
}

#[tokio::test]
async fn test_chain_failure_is_verification_call_error() {
    let chain = Arc::new(FlakyChain {
        inner: DevChain::new(),
        failing: AtomicBool::new(false),
    });
    let state = dev_state_with(chain.clone(), Arc::new(DigestProver::new())).await;
    state.load_circuits().await.unwrap();

    let claim = signed_claim(&KeyPair::generate(), "dataset");
    let proof = prove(&state, &claim).await.unwrap();

    chain.failing.store(true, Ordering::SeqCst);
    let err = state
        .verifier
        .verify_proof(StatementPurpose::ProofOfProvenance, &proof)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::VerificationCall(_)));
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_authorize_twice_yields_one_token() {
    let state = ready_state(Arc::new(DigestProver::new())).await;
    let alice = KeyPair::generate().address();
    let bob = KeyPair::generate().address();

    let first = state.access.authorize(alice, Role::Provider).await.unwrap();
    let again = state.access.authorize(alice, Role::Provider).await.unwrap();
    let other = state.access.authorize(bob, Role::Provider).await.unwrap();

    assert_eq!(first, again);
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_concurrent_authorize_yields_one_token() {
    let state = Arc::new(ready_state(Arc::new(DigestProver::new())).await);
    let alice = KeyPair::generate().address();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.access.authorize(alice, Role::Analyst).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}
