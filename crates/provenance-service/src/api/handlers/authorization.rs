//! Authorization Handlers
//!
//! Role tokens and access policies.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use provenance_core::{AccessPolicy, Address, PublicKey, Role, TokenId};

use crate::api::error::ApiError;
use crate::core::RequestSignature;
use crate::state::AppState;

use super::AddressQuery;

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub address: Address,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub address: Address,
    pub role: Role,
    pub token_id: TokenId,
}

#[derive(Debug, Deserialize)]
pub struct HasRoleQuery {
    pub address: Address,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct HasRoleResponse {
    pub address: Address,
    pub role: Role,
    pub has_role: bool,
}

/// Request to replace an access policy, signed by its owner
#[derive(Debug, Deserialize)]
pub struct SetAccessPolicyRequest {
    /// Policy owner; defaults to the address of `auth.public_key`
    #[serde(default)]
    pub owner: Option<Address>,
    pub policy: AccessPolicy,
    pub auth: RequestSignature,
}

#[derive(Debug, Serialize)]
pub struct AccessPolicyResponse {
    pub owner: Address,
    pub policy: AccessPolicy,
}

#[derive(Debug, Serialize)]
pub struct AllAccessPoliciesResponse {
    pub policies: BTreeMap<Address, AccessPolicy>,
    pub count: usize,
}

async fn authorize(state: &AppState, address: Address, role: Role) -> Result<Json<TokenResponse>, ApiError> {
    let token_id = state.access.authorize(address, role).await?;
    Ok(Json(TokenResponse {
        address,
        role,
        token_id,
    }))
}

async fn token_id(state: &AppState, address: Address, role: Role) -> Result<Json<TokenResponse>, ApiError> {
    let token_id = state.access.get_token_id(address, role).await?;
    Ok(Json(TokenResponse {
        address,
        role,
        token_id,
    }))
}

/// POST /authorize_provider
pub async fn authorize_provider(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = request?;
    authorize(&state, request.address, Role::Provider).await
}

/// POST /authorize_analyst
pub async fn authorize_analyst(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = request?;
    authorize(&state, request.address, Role::Analyst).await
}

/// GET /provider_token_id?address=
pub async fn provider_token_id(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Query(query) = query?;
    token_id(&state, query.address, Role::Provider).await
}

/// GET /analyst_token_id?address=
pub async fn analyst_token_id(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Query(query) = query?;
    token_id(&state, query.address, Role::Analyst).await
}

/// GET /has_role?address=&role=
pub async fn has_role(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HasRoleQuery>, QueryRejection>,
) -> Result<Json<HasRoleResponse>, ApiError> {
    let Query(query) = query?;
    let has_role = state.access.has_role(query.address, query.role).await?;
    Ok(Json(HasRoleResponse {
        address: query.address,
        role: query.role,
        has_role,
    }))
}

/// POST /access_policies
pub async fn set_access_policy(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SetAccessPolicyRequest>, JsonRejection>,
) -> Result<Json<AccessPolicyResponse>, ApiError> {
    let Json(request) = request?;
    let owner = match request.owner {
        Some(owner) => owner,
        None => PublicKey::from_hex(&request.auth.public_key)?.address(),
    };
    state
        .access
        .set_access_policy(owner, request.policy.clone(), &request.auth)
        .await?;
    Ok(Json(AccessPolicyResponse {
        owner,
        policy: request.policy,
    }))
}

/// GET /access_policies?address=
pub async fn get_access_policy(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<AccessPolicyResponse>, ApiError> {
    let Query(query) = query?;
    let policy = state.access.get_access_policy(query.address).await?;
    Ok(Json(AccessPolicyResponse {
        owner: query.address,
        policy,
    }))
}

/// GET /all_access_policies
pub async fn get_all_access_policies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AllAccessPoliciesResponse>, ApiError> {
    let policies = state.access.get_all_access_policies().await?;
    let count = policies.len();
    Ok(Json(AllAccessPoliciesResponse { policies, count }))
}
