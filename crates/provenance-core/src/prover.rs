//! Proving collaborator interface and the development proving backend

use async_trait::async_trait;
use tracing::{debug, info};

use crate::crypto::{keccak256, PublicKey};
use crate::encoding::{CircuitInputVector, FieldElement, ProvenanceWitness};
use crate::error::{ProvenanceError, Result};
use crate::proof::Proof;

/// Circuit verifying a secp256k1 signature over a byte hash
pub const SCHNORR_CIRCUIT: &str = "schnorr";

/// Loaded artifacts for one circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitHandle {
    /// Circuit name (artifact directory)
    pub circuit_name: String,
    /// Backend that loaded the artifacts
    pub backend: String,
    /// Digest identifying the loaded artifacts
    pub artifact_digest: [u8; 32],
}

/// External proving procedure: inputs in, proof and public signals out.
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Name of this backend (for logging)
    fn name(&self) -> &str;

    /// Load the artifacts of a circuit
    async fn load_artifacts(&self, circuit_name: &str) -> Result<CircuitHandle>;

    /// Prove an input vector against loaded artifacts.
    ///
    /// Fails with [`ProvenanceError::Proving`] when the witness does not
    /// satisfy the circuit.
    async fn prove(&self, handle: &CircuitHandle, input: &CircuitInputVector) -> Result<Proof>;
}

/// Deterministic proving backend for development networks.
///
/// Checks the witness the way the `schnorr` circuit constrains it, then emits
/// a keccak-256 commitment over the circuit name and public signals as the
/// proof blob. [`DigestProver::check`] is the matching verification rule.
#[derive(Debug, Clone, Default)]
pub struct DigestProver;

const COMMITMENT_DOMAIN: &[u8] = b"provenance/digest-prover/v1";

impl DigestProver {
    pub fn new() -> Self {
        Self
    }

    /// Commitment binding a circuit to its public signals
    pub fn commitment(circuit_name: &str, public_signals: &[FieldElement]) -> [u8; 32] {
        let mut preimage = Vec::with_capacity(
            COMMITMENT_DOMAIN.len() + circuit_name.len() + 1 + public_signals.len() * 32,
        );
        preimage.extend_from_slice(COMMITMENT_DOMAIN);
        preimage.extend_from_slice(circuit_name.as_bytes());
        preimage.push(0);
        for signal in public_signals {
            preimage.extend_from_slice(signal.as_bytes());
        }
        keccak256(&preimage)
    }

    /// Verify a proof blob produced by this backend
    pub fn check(circuit_name: &str, proof: &[u8], public_signals: &[FieldElement]) -> bool {
        proof == Self::commitment(circuit_name, public_signals).as_slice()
    }

    fn check_witness(circuit_name: &str, input: &CircuitInputVector) -> Result<()> {
        match circuit_name {
            SCHNORR_CIRCUIT => {
                let witness = ProvenanceWitness::from_inputs(input)
                    .map_err(|e| ProvenanceError::Proving(format!("malformed witness: {}", e)))?;
                let public_key = PublicKey::from_bytes(&witness.public_key)
                    .map_err(|_| ProvenanceError::Proving("public key is not a curve point".into()))?;
                if !public_key.verify_hash(&witness.hash, &witness.signature) {
                    return Err(ProvenanceError::Proving(
                        "signature constraint unsatisfied".into(),
                    ));
                }
                Ok(())
            }
            other => Err(ProvenanceError::UnknownCircuit(other.to_string())),
        }
    }
}

#[async_trait]
impl ProvingBackend for DigestProver {
    fn name(&self) -> &str {
        "digest"
    }

    async fn load_artifacts(&self, circuit_name: &str) -> Result<CircuitHandle> {
        if circuit_name != SCHNORR_CIRCUIT {
            return Err(ProvenanceError::UnknownCircuit(circuit_name.to_string()));
        }
        let artifact_digest = keccak256(circuit_name.as_bytes());
        info!(circuit = %circuit_name, backend = self.name(), "Loaded circuit artifacts");
        Ok(CircuitHandle {
            circuit_name: circuit_name.to_string(),
            backend: self.name().to_string(),
            artifact_digest,
        })
    }

    async fn prove(&self, handle: &CircuitHandle, input: &CircuitInputVector) -> Result<Proof> {
        Self::check_witness(&handle.circuit_name, input)?;
        let blob = Self::commitment(&handle.circuit_name, &input.public_inputs);
        debug!(
            circuit = %handle.circuit_name,
            signals = input.public_inputs.len(),
            "Generated proof"
        );
        Ok(Proof::new(blob.to_vec(), input.public_inputs.clone()))
    }
}
