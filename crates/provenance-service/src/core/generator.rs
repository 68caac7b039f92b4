//! Proof generation
//!
//! Circuit artifacts are loaded once, after contract resolution, for every
//! circuit the verifier contracts reference. Until then every generation
//! request fails with `NotReady`.

use once_cell::sync::OnceCell;
use provenance_core::{CircuitHandle, CircuitInputVector, Proof, ProvenanceError, ProvingBackend};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::Result;

pub struct ProofGenerator {
    backend: Arc<dyn ProvingBackend>,
    circuits: OnceCell<HashMap<String, CircuitHandle>>,
}

impl ProofGenerator {
    pub fn new(backend: Arc<dyn ProvingBackend>) -> Self {
        Self {
            backend,
            circuits: OnceCell::new(),
        }
    }

    /// Load the artifacts of every named circuit.
    ///
    /// Readiness flips only once all of them are loaded; a failure leaves the
    /// generator not ready.
    pub async fn load_circuits(&self, circuit_names: &[String]) -> Result<()> {
        if self.circuits.get().is_some() {
            warn!("Circuit artifacts already loaded");
            return Ok(());
        }

        let mut circuits = HashMap::with_capacity(circuit_names.len());
        for name in circuit_names {
            let handle = self.backend.load_artifacts(name).await?;
            info!(
                circuit = %name,
                backend = %self.backend.name(),
                "Circuit ready"
            );
            circuits.insert(name.clone(), handle);
        }

        if self.circuits.set(circuits).is_err() {
            warn!("Circuit artifacts were loaded concurrently");
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.circuits.get().is_some()
    }

    /// Names of the loaded circuits
    pub fn loaded_circuits(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .circuits
            .get()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Prove an encoded input vector with a loaded circuit
    pub async fn generate(&self, circuit_name: &str, input: &CircuitInputVector) -> Result<Proof> {
        let circuits = self
            .circuits
            .get()
            .ok_or_else(|| ProvenanceError::NotReady("circuit artifacts are still loading".into()))?;
        let handle = circuits
            .get(circuit_name)
            .ok_or_else(|| ProvenanceError::UnknownCircuit(circuit_name.to_string()))?;

        match self.backend.prove(handle, input).await {
            Ok(proof) => {
                info!(
                    circuit = %circuit_name,
                    public_signals = proof.public_signals.len(),
                    "Generated proof"
                );
                Ok(proof)
            }
            Err(e) => {
                warn!(circuit = %circuit_name, error = %e, "Proof generation failed");
                Err(e.into())
            }
        }
    }
}
