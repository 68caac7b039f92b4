//! Proof Handlers
//!
//! Generation and both verification stages. Request bodies carry the raw
//! statement material next to an optional `purpose` (default
//! `proof_of_provenance`), which selects the verifier contract and with it
//! the encoder and circuit.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use provenance_core::{Address, Proof, RawArgs, StatementPurpose};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Request to generate a proof
#[derive(Debug, Deserialize)]
pub struct GenerateProofRequest {
    #[serde(default)]
    pub purpose: StatementPurpose,

    /// Statement material, e.g. `public_key`, `hash`, `signature`
    #[serde(flatten)]
    pub args: RawArgs,
}

#[derive(Debug, Serialize)]
pub struct GenerateProofResponse {
    pub purpose: StatementPurpose,
    pub circuit: String,
    /// Verifier contract that accepts this proof
    pub verifier: Address,
    pub proof: Proof,
}

/// Request to check a proof against claimed statement material
#[derive(Debug, Deserialize)]
pub struct VerifyPublicInputsRequest {
    #[serde(default)]
    pub purpose: StatementPurpose,

    pub proof: Proof,

    #[serde(flatten)]
    pub args: RawArgs,
}

#[derive(Debug, Deserialize)]
pub struct VerifyProofRequest {
    #[serde(default)]
    pub purpose: StatementPurpose,

    pub proof: Proof,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub valid: bool,
}

/// Generate a proof for the statement material
///
/// POST /generate_proof
pub async fn generate_proof(
    State(state): State<Arc<AppState>>,
    request: Result<Json<GenerateProofRequest>, JsonRejection>,
) -> Result<Json<GenerateProofResponse>, ApiError> {
    let Json(request) = request?;

    let binding = state
        .contracts
        .verifier_for(request.purpose)
        .map_err(crate::core::ServiceError::from)?;
    let circuit = binding
        .circuit_name()
        .ok_or_else(|| ApiError::Internal(format!("{} has no circuit", binding.logical_name)))?
        .to_string();

    let input = request.purpose.encode(&request.args)?;
    let proof = state.generator.generate(&circuit, &input).await?;

    info!(
        purpose = %request.purpose,
        verifier = %binding.logical_name,
        "Proof generated"
    );

    Ok(Json(GenerateProofResponse {
        purpose: request.purpose,
        circuit,
        verifier: binding.address,
        proof,
    }))
}

/// Check that a proof's public signals match the claimed material
///
/// POST /verify_public_inputs
pub async fn verify_public_inputs(
    State(state): State<Arc<AppState>>,
    request: Result<Json<VerifyPublicInputsRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let Json(request) = request?;

    let valid = state
        .verifier
        .verify_public_inputs(request.purpose, &request.args, &request.proof)?;
    Ok(Json(VerificationResponse { valid }))
}

/// Verify a proof with the on-chain verifier
///
/// POST /verify_proof
pub async fn verify_proof(
    State(state): State<Arc<AppState>>,
    request: Result<Json<VerifyProofRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let Json(request) = request?;
    let valid = state
        .verifier
        .verify_proof(request.purpose, &request.proof)
        .await?;
    Ok(Json(VerificationResponse { valid }))
}
