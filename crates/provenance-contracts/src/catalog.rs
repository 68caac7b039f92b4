//! Contract catalog
//!
//! The logical contracts the service resolves, their artifacts, and the
//! dependency graph between them. A contract that takes another contract's
//! address as a constructor argument lists it as a dependency; the argument
//! order follows the dependency order.

use provenance_core::{Role, StatementPurpose, SCHNORR_CIRCUIT};
use std::collections::{BTreeSet, HashMap};

use crate::chain::{ContractArtifact, ContractKind};
use crate::error::{ContractError, Result};

pub const DATA_PROVIDERS_NFTS: &str = "DataProvidersNFTs";
pub const DATA_ANALYSTS_NFTS: &str = "DataAnalystsNFTs";
pub const VERIFIER_PROVENANCE: &str = "VerifierProvenance";
pub const SCHRODINGER_PROTOCOL: &str = "SchrodingerProtocol";

/// Circuit and statement purpose served by a verifier contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSpec {
    pub circuit_name: String,
    pub purpose: StatementPurpose,
}

/// One logical contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    pub logical_name: String,
    pub artifact: ContractArtifact,
    pub dependencies: Vec<String>,
    pub verifier: Option<VerifierSpec>,
}

impl ContractSpec {
    pub fn new(logical_name: impl Into<String>, artifact: ContractArtifact) -> Self {
        Self {
            logical_name: logical_name.into(),
            artifact,
            dependencies: Vec::new(),
            verifier: None,
        }
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn verifier(mut self, circuit_name: impl Into<String>, purpose: StatementPurpose) -> Self {
        self.verifier = Some(VerifierSpec {
            circuit_name: circuit_name.into(),
            purpose,
        });
        self
    }
}

/// Validated set of logical contracts
#[derive(Debug, Clone)]
pub struct ContractCatalog {
    specs: Vec<ContractSpec>,
    order: Vec<usize>,
}

impl ContractCatalog {
    /// Validate the declarations and compute the deployment order
    pub fn new(specs: Vec<ContractSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.logical_name.as_str(), i).is_some() {
                return Err(ContractError::DuplicateContract(spec.logical_name.clone()));
            }
        }

        let mut edges = vec![Vec::new(); specs.len()];
        let mut in_degree = vec![0usize; specs.len()];
        for (i, spec) in specs.iter().enumerate() {
            for dep in &spec.dependencies {
                let &d = index
                    .get(dep.as_str())
                    .ok_or_else(|| ContractError::UnknownDependency {
                        contract: spec.logical_name.clone(),
                        dependency: dep.clone(),
                    })?;
                edges[d].push(i);
                in_degree[i] += 1;
            }
        }

        // Kahn's algorithm; among ready contracts the earliest declared goes first
        let mut ready: BTreeSet<usize> = (0..specs.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(specs.len());
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &next in &edges[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() != specs.len() {
            let stuck = (0..specs.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| specs[i].logical_name.clone())
                .collect();
            return Err(ContractError::DependencyCycle(stuck));
        }

        Ok(Self { specs, order })
    }

    /// The service's contracts
    pub fn standard() -> Result<Self> {
        Self::new(vec![
            ContractSpec::new(
                DATA_PROVIDERS_NFTS,
                ContractArtifact::new(
                    "DataProvidersNFTs",
                    "DataProvidersNFTs.sol",
                    ContractKind::RoleToken {
                        role: Role::Provider,
                    },
                ),
            ),
            ContractSpec::new(
                DATA_ANALYSTS_NFTS,
                ContractArtifact::new(
                    "DataAnalystsNFTs",
                    "DataAnalystsNFTs.sol",
                    ContractKind::RoleToken {
                        role: Role::Analyst,
                    },
                ),
            )
            .depends_on(DATA_PROVIDERS_NFTS),
            ContractSpec::new(
                VERIFIER_PROVENANCE,
                ContractArtifact::new(
                    "Groth16Verifier",
                    "VerifierProvenance.sol",
                    ContractKind::Verifier {
                        circuit_name: SCHNORR_CIRCUIT.to_string(),
                    },
                ),
            )
            .verifier(SCHNORR_CIRCUIT, StatementPurpose::ProofOfProvenance),
            ContractSpec::new(
                SCHRODINGER_PROTOCOL,
                ContractArtifact::new(
                    "SchrodingerProtocol",
                    "SchrodingerProtocol.sol",
                    ContractKind::Protocol,
                ),
            )
            .depends_on(DATA_PROVIDERS_NFTS)
            .depends_on(DATA_ANALYSTS_NFTS)
            .depends_on(VERIFIER_PROVENANCE),
        ])
    }

    pub fn get(&self, logical_name: &str) -> Option<&ContractSpec> {
        self.specs.iter().find(|s| s.logical_name == logical_name)
    }

    /// Specs in declaration order
    pub fn specs(&self) -> &[ContractSpec] {
        &self.specs
    }

    /// Every dependency comes before its dependents
    pub fn deployment_order(&self) -> impl Iterator<Item = &ContractSpec> {
        self.order.iter().map(|&i| &self.specs[i])
    }

    pub fn verifiers(&self) -> impl Iterator<Item = (&ContractSpec, &VerifierSpec)> {
        self.specs
            .iter()
            .filter_map(|s| s.verifier.as_ref().map(|v| (s, v)))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
