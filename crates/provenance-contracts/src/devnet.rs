//! In-process development chain
//!
//! The ephemeral network: recreated every run, contracts deployed at startup.
//! Each artifact kind gets a small state machine that mirrors what the
//! deployed contract does on a real network.

use async_trait::async_trait;
use provenance_core::{
    encoding::decode_hex_field, keccak256, AccessPolicy, Address, DigestProver, FieldElement, Role,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::chain::{methods, ChainClient, ContractArtifact, ContractInterface, ContractKind, Receipt};
use crate::error::{ContractError, Result};
use crate::network::DEVELOPMENT;

/// Ephemeral in-process chain
#[derive(Debug)]
pub struct DevChain {
    network: String,
    state: RwLock<ChainState>,
}

#[derive(Debug, Default)]
struct ChainState {
    nonce: u64,
    block_number: u64,
    contracts: HashMap<Address, DevContract>,
}

#[derive(Debug)]
struct DevContract {
    artifact: ContractArtifact,
    interface: ContractInterface,
    constructor_args: Vec<Value>,
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    RoleToken {
        role: Role,
        tokens: BTreeMap<Address, u64>,
    },
    Verifier {
        circuit_name: String,
    },
    Protocol {
        policies: BTreeMap<Address, AccessPolicy>,
        public_keys: BTreeMap<Address, String>,
        data: BTreeMap<Address, Value>,
        signatures: BTreeMap<Address, Vec<Value>>,
    },
}

impl Storage {
    fn for_kind(kind: &ContractKind) -> Self {
        match kind {
            ContractKind::RoleToken { role } => Storage::RoleToken {
                role: *role,
                tokens: BTreeMap::new(),
            },
            ContractKind::Verifier { circuit_name } => Storage::Verifier {
                circuit_name: circuit_name.clone(),
            },
            ContractKind::Protocol => Storage::Protocol {
                policies: BTreeMap::new(),
                public_keys: BTreeMap::new(),
                data: BTreeMap::new(),
                signatures: BTreeMap::new(),
            },
        }
    }
}

impl DevChain {
    pub fn new() -> Self {
        Self::with_network(DEVELOPMENT)
    }

    /// Development chain answering for another network name (tests)
    pub fn with_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            state: RwLock::new(ChainState::default()),
        }
    }

    /// Number of deployed contracts
    pub fn contract_count(&self) -> usize {
        self.read().contracts.len()
    }

    /// Deploy an artifact at a chosen address (tests standing in for a
    /// previously recorded deployment)
    pub fn install(&self, address: Address, artifact: &ContractArtifact, args: Vec<Value>) {
        let mut state = self.write();
        state.contracts.insert(address, DevContract::new(artifact, args));
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ChainState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ChainState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DevChain {
    fn default() -> Self {
        Self::new()
    }
}

impl DevContract {
    fn new(artifact: &ContractArtifact, constructor_args: Vec<Value>) -> Self {
        Self {
            artifact: artifact.clone(),
            interface: artifact.interface(),
            constructor_args,
            storage: Storage::for_kind(&artifact.kind),
        }
    }

    /// Check the caller's descriptor against the deployed code
    fn check_method(&self, interface: &ContractInterface, method: &str) -> Result<bool> {
        let unknown = || ContractError::UnknownMethod {
            contract: interface.contract.clone(),
            method: method.to_string(),
        };
        interface.method(method).ok_or_else(unknown)?;
        let deployed = self.interface.method(method).ok_or_else(unknown)?;
        Ok(deployed.mutates)
    }

    fn view(&self, method: &str, args: &[Value]) -> Result<Value> {
        match (&self.storage, method) {
            (Storage::RoleToken { tokens, .. }, methods::TOKEN_OF) => {
                let owner: Address = arg(method, args, 0)?;
                Ok(tokens.get(&owner).map_or(Value::Null, |id| json!(id)))
            }
            (Storage::RoleToken { tokens, .. }, methods::TOTAL_SUPPLY) => Ok(json!(tokens.len())),
            (Storage::Verifier { circuit_name }, methods::VERIFY_PROOF) => {
                let proof: String = arg(method, args, 0)?;
                let signals: Vec<FieldElement> = arg(method, args, 1)?;
                let blob = decode_hex_field("proof", &proof)
                    .map_err(|e| ContractError::Reverted(e.to_string()))?;
                Ok(json!(DigestProver::check(circuit_name, &blob, &signals)))
            }
            (Storage::Protocol { .. }, methods::DEPENDENCIES) => {
                Ok(Value::Array(self.constructor_args.clone()))
            }
            (Storage::Protocol { policies, .. }, methods::GET_ACCESS_POLICY) => {
                let owner: Address = arg(method, args, 0)?;
                let policy = policies.get(&owner).cloned().unwrap_or_default();
                Ok(serde_json::to_value(policy)?)
            }
            (Storage::Protocol { policies, .. }, methods::GET_ALL_ACCESS_POLICIES) => {
                Ok(serde_json::to_value(policies)?)
            }
            (Storage::Protocol { public_keys, .. }, methods::GET_PUBLIC_KEY) => {
                let owner: Address = arg(method, args, 0)?;
                Ok(public_keys.get(&owner).map_or(Value::Null, |k| json!(k)))
            }
            (Storage::Protocol { data, .. }, methods::GET_DATA) => {
                let owner: Address = arg(method, args, 0)?;
                Ok(data.get(&owner).cloned().unwrap_or(Value::Null))
            }
            (Storage::Protocol { signatures, .. }, methods::GET_SIGNATURES) => {
                let owner: Address = arg(method, args, 0)?;
                Ok(Value::Array(signatures.get(&owner).cloned().unwrap_or_default()))
            }
            _ => Err(unknown_method(&self.artifact, method)),
        }
    }

    fn execute(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match (&mut self.storage, method) {
            (Storage::RoleToken { role, tokens }, methods::MINT) => {
                let to: Address = arg(method, args, 0)?;
                if tokens.contains_key(&to) {
                    return Err(ContractError::Reverted(format!(
                        "{} already holds a {} token",
                        to, role
                    )));
                }
                let token_id = tokens.len() as u64 + 1;
                tokens.insert(to, token_id);
                Ok(json!(token_id))
            }
            (Storage::Protocol { policies, .. }, methods::SET_ACCESS_POLICY) => {
                let owner: Address = arg(method, args, 0)?;
                let policy: AccessPolicy = arg(method, args, 1)?;
                policies.insert(owner, policy);
                Ok(Value::Null)
            }
            (Storage::Protocol { public_keys, .. }, methods::SET_PUBLIC_KEY) => {
                let owner: Address = arg(method, args, 0)?;
                let key: String = arg(method, args, 1)?;
                public_keys.insert(owner, key);
                Ok(Value::Null)
            }
            (Storage::Protocol { public_keys, .. }, methods::RESET_PUBLIC_KEYS) => {
                public_keys.clear();
                Ok(Value::Null)
            }
            (Storage::Protocol { data, .. }, methods::SET_DATA) => {
                let owner: Address = arg(method, args, 0)?;
                let value: Value = arg(method, args, 1)?;
                data.insert(owner, value);
                Ok(Value::Null)
            }
            (Storage::Protocol { signatures, .. }, methods::UPLOAD_SIGNATURE) => {
                let owner: Address = arg(method, args, 0)?;
                let hash: String = arg(method, args, 1)?;
                let signature: String = arg(method, args, 2)?;
                let log = signatures.entry(owner).or_default();
                log.push(json!({ "hash": hash, "signature": signature }));
                Ok(json!(log.len()))
            }
            _ => Err(unknown_method(&self.artifact, method)),
        }
    }
}

fn unknown_method(artifact: &ContractArtifact, method: &str) -> ContractError {
    ContractError::UnknownMethod {
        contract: artifact.contract.clone(),
        method: method.to_string(),
    }
}

fn arg<T: DeserializeOwned>(method: &str, args: &[Value], index: usize) -> Result<T> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| ContractError::Reverted(format!("{}: bad argument {}: {}", method, index, e)))
}

#[async_trait]
impl ChainClient for DevChain {
    fn network(&self) -> &str {
        &self.network
    }

    async fn deploy(&self, artifact: &ContractArtifact, args: Vec<Value>) -> Result<Address> {
        let mut state = self.write();
        state.nonce += 1;

        let mut preimage = b"provenance/devchain".to_vec();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        let address = Address::from_digest(&keccak256(&preimage));

        state.block_number += 1;
        state.contracts.insert(address, DevContract::new(artifact, args));

        info!(
            contract = %artifact.contract,
            address = %address,
            block = state.block_number,
            "Deployed contract on development chain"
        );
        Ok(address)
    }

    async fn call(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        let state = self.read();
        let contract = state
            .contracts
            .get(&address)
            .ok_or_else(|| ContractError::Call(format!("no contract at {}", address)))?;

        if contract.check_method(interface, method)? {
            return Err(ContractError::Call(format!(
                "{}.{} changes state and must be sent",
                interface.contract, method
            )));
        }
        contract.view(method, &args)
    }

    async fn send(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Receipt> {
        let mut state = self.write();
        let contract = state
            .contracts
            .get_mut(&address)
            .ok_or_else(|| ContractError::Call(format!("no contract at {}", address)))?;

        contract.check_method(interface, method)?;
        let output = contract.execute(method, &args)?;

        state.block_number += 1;
        let mut preimage = address.as_bytes().to_vec();
        preimage.extend_from_slice(method.as_bytes());
        preimage.extend_from_slice(&state.block_number.to_be_bytes());
        let receipt = Receipt {
            transaction_hash: format!("0x{}", hex::encode(keccak256(&preimage))),
            block_number: state.block_number,
            output,
        };

        debug!(
            address = %address,
            method = %method,
            block = receipt.block_number,
            "Transaction mined"
        );
        Ok(receipt)
    }
}
