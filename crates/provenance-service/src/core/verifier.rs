//! Two-stage proof verification
//!
//! `verify_public_inputs` re-derives the public inputs from the claimed
//! request material and compares them with the proof's signals; it never
//! touches the chain. `verify_proof` asks the verifier contract bound to the
//! statement purpose. A rejected proof is `Ok(false)`; only a failed call is
//! an error.

use provenance_contracts::{methods, ContractRegistry};
use provenance_core::{Proof, RawArgs, StatementPurpose};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{Result, ServiceError};

pub struct ProofVerifier {
    contracts: Arc<ContractRegistry>,
}

impl ProofVerifier {
    pub fn new(contracts: Arc<ContractRegistry>) -> Self {
        Self { contracts }
    }

    /// Whether the proof's public signals match the inputs derived from `args`
    pub fn verify_public_inputs(
        &self,
        purpose: StatementPurpose,
        args: &RawArgs,
        proof: &Proof,
    ) -> Result<bool> {
        let expected = purpose.encode(args)?;
        let matches = proof.signals_match(&expected.public_inputs);
        if !matches {
            info!(purpose = %purpose, "Public signals do not match the claimed inputs");
        }
        Ok(matches)
    }

    /// Submit the proof to the verifier contract for `purpose`
    pub async fn verify_proof(&self, purpose: StatementPurpose, proof: &Proof) -> Result<bool> {
        let binding = self.contracts.verifier_for(purpose)?;
        let args = vec![
            json!(format!("0x{}", hex::encode(&proof.proof))),
            json!(proof.public_signals),
        ];

        let result = self
            .contracts
            .chain()
            .call(binding.address, &binding.interface, methods::VERIFY_PROOF, args)
            .await
            .map_err(|e| {
                warn!(verifier = %binding.logical_name, error = %e, "Verification call failed");
                ServiceError::VerificationCall(e.to_string())
            })?;

        match result {
            Value::Bool(valid) => {
                info!(
                    verifier = %binding.logical_name,
                    address = %binding.address,
                    valid,
                    "Proof verified on chain"
                );
                Ok(valid)
            }
            other => Err(ServiceError::VerificationCall(format!(
                "verifier returned non-boolean result {}",
                other
            ))),
        }
    }
}
