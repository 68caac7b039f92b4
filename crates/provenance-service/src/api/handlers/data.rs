//! Data Handlers
//!
//! Data-source descriptors and uploaded signatures of providers.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use provenance_core::Address;

use crate::api::error::ApiError;
use crate::core::{RequestSignature, SignatureRecord};
use crate::state::AppState;

use super::AddressQuery;

#[derive(Debug, Deserialize)]
pub struct SetDataRequest {
    pub address: Address,
    /// Opaque data-source descriptor
    pub data: Value,
}

/// `?owner=&requester=&public_key=&signature=&issued_at=`, signed by the requester
#[derive(Debug, Deserialize)]
pub struct GetDataQuery {
    pub owner: Address,
    pub requester: Address,
    pub public_key: String,
    pub signature: String,
    pub issued_at: i64,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub owner: Address,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct UploadSignatureRequest {
    pub address: Address,
    pub hash: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct UploadSignatureResponse {
    pub address: Address,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SignaturesResponse {
    pub address: Address,
    pub signatures: Vec<SignatureRecord>,
}

/// POST /set_data
pub async fn set_data(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SetDataRequest>, JsonRejection>,
) -> Result<Json<DataResponse>, ApiError> {
    let Json(request) = request?;
    state.data.set_data(request.address, request.data.clone()).await?;
    Ok(Json(DataResponse {
        owner: request.address,
        data: request.data,
    }))
}

/// GET /get_data?owner=&requester=&public_key=&signature=&issued_at=
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GetDataQuery>, QueryRejection>,
) -> Result<Json<DataResponse>, ApiError> {
    let Query(query) = query?;
    let auth = RequestSignature {
        public_key: query.public_key,
        signature: query.signature,
        issued_at: query.issued_at,
    };
    let data = state
        .data
        .get_data(query.owner, query.requester, &auth)
        .await?;
    Ok(Json(DataResponse {
        owner: query.owner,
        data,
    }))
}

/// POST /upload_signature
pub async fn upload_signature(
    State(state): State<Arc<AppState>>,
    request: Result<Json<UploadSignatureRequest>, JsonRejection>,
) -> Result<Json<UploadSignatureResponse>, ApiError> {
    let Json(request) = request?;
    let count = state
        .data
        .upload_signature(request.address, &request.hash, &request.signature)
        .await?;
    Ok(Json(UploadSignatureResponse {
        address: request.address,
        count,
    }))
}

/// GET /signatures?address=
pub async fn get_signatures(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<SignaturesResponse>, ApiError> {
    let Query(query) = query?;
    let signatures = state.data.get_signatures(query.address).await?;
    Ok(Json(SignaturesResponse {
        address: query.address,
        signatures,
    }))
}
