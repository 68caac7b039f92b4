//! Key Management Handlers
//!
//! Key pair generation, signing with the service's accounts, and the
//! per-address public key records.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use provenance_core::{Address, PublicKey};

use crate::api::error::ApiError;
use crate::keys::{GeneratedKeyPair, KeyRegistry, SignedHash};
use crate::state::AppState;

use super::AddressQuery;

/// Request to sign a 32-byte hash
#[derive(Debug, Deserialize)]
pub struct SignHashRequest {
    /// One of the service's signing accounts
    pub account: Address,
    /// Hex-encoded hash (`0x` optional)
    pub hash: String,
}

/// Request to hash and sign a message
#[derive(Debug, Deserialize)]
pub struct SignMessageRequest {
    pub account: Address,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPublicKeyRequest {
    pub address: Address,
    /// Hex-encoded 64-byte public key
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    pub address: Address,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: bool,
}

/// GET /key_pair
pub async fn generate_key_pair() -> Json<GeneratedKeyPair> {
    Json(KeyRegistry::generate_key_pair())
}

/// POST /sign_hash
pub async fn sign_hash(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SignHashRequest>, JsonRejection>,
) -> Result<Json<SignedHash>, ApiError> {
    let Json(request) = request?;
    Ok(Json(state.keys.sign_hash(request.account, &request.hash)?))
}

/// POST /sign_message
///
/// The message is hashed with keccak-256 before signing.
pub async fn sign_message(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SignMessageRequest>, JsonRejection>,
) -> Result<Json<SignedHash>, ApiError> {
    let Json(request) = request?;
    Ok(Json(state.keys.sign_message(request.account, &request.message)?))
}

/// GET /publickey?address=
pub async fn get_public_key(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let Query(query) = query?;
    let key = state.keys.get_public_key(query.address).await?;
    Ok(Json(PublicKeyResponse {
        address: query.address,
        public_key: key.to_hex(),
    }))
}

/// PUT /publickey
pub async fn set_public_key(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SetPublicKeyRequest>, JsonRejection>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let Json(request) = request?;
    let key = PublicKey::from_hex(&request.public_key)?;
    state.keys.set_public_key(request.address, &key).await?;
    Ok(Json(PublicKeyResponse {
        address: request.address,
        public_key: key.to_hex(),
    }))
}

/// GET /reset_public_keys (development only)
pub async fn reset_public_keys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    state.keys.reset_all().await?;
    Ok(Json(ResetResponse { reset: true }))
}
