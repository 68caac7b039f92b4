//! Signing account handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use provenance_core::Address;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Address>,
    pub count: usize,
}

/// GET /accounts
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<AccountsResponse> {
    let accounts = state.keys.list_accounts();
    let count = accounts.len();
    Json(AccountsResponse { accounts, count })
}

/// GET /reset_accounts (development only)
pub async fn reset_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let accounts = state.keys.reset_accounts()?;
    let count = accounts.len();
    Ok(Json(AccountsResponse { accounts, count }))
}
