//! HTTP boundary
//!
//! Every public operation is one route; request and response bodies are
//! JSON, and failures render as `{ "error", "code" }` with a status per
//! error kind.

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use provenance_core::{Address, StatementPurpose};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub contracts_resolved: bool,
    pub circuits_loaded: bool,
    pub circuits: Vec<String>,
    pub network: String,
    pub started_at: DateTime<Utc>,
}

/// A verifier contract and the statement it checks
#[derive(Serialize)]
pub struct AvailableFunction {
    pub name: String,
    pub address: Address,
    pub circuit: Option<String>,
    pub purpose: Option<StatementPurpose>,
}

#[derive(Serialize)]
pub struct AvailableFunctionsResponse {
    pub network: String,
    pub functions: Vec<AvailableFunction>,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint; 503 until circuit artifacts are loaded
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Response {
    let body = ReadyResponse {
        ready: state.is_ready(),
        contracts_resolved: state.contracts.is_resolved(),
        circuits_loaded: state.generator.is_ready(),
        circuits: state.generator.loaded_circuits(),
        network: state.contracts.network().to_string(),
        started_at: state.started_at,
    };

    let status = if body.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// Verifier bindings
///
/// GET /available_functions
pub async fn available_functions(
    State(state): State<Arc<AppState>>,
) -> Json<AvailableFunctionsResponse> {
    let functions = state
        .contracts
        .verifiers()
        .into_iter()
        .map(|binding| AvailableFunction {
            name: binding.logical_name.clone(),
            address: binding.address,
            circuit: binding.circuit_name().map(str::to_string),
            purpose: binding.purpose(),
        })
        .collect();

    Json(AvailableFunctionsResponse {
        network: state.contracts.network().to_string(),
        functions,
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Accounts and keys
        .route("/accounts", get(handlers::list_accounts))
        .route("/reset_accounts", get(handlers::reset_accounts))
        .route("/key_pair", get(handlers::generate_key_pair))
        .route("/sign_hash", post(handlers::sign_hash))
        .route("/sign_message", post(handlers::sign_message))
        .route(
            "/publickey",
            get(handlers::get_public_key).put(handlers::set_public_key),
        )
        .route("/reset_public_keys", get(handlers::reset_public_keys))
        // Proofs
        .route("/available_functions", get(available_functions))
        .route("/generate_proof", post(handlers::generate_proof))
        .route("/verify_public_inputs", post(handlers::verify_public_inputs))
        .route("/verify_proof", post(handlers::verify_proof))
        // Authorization
        .route("/authorize_provider", post(handlers::authorize_provider))
        .route("/authorize_analyst", post(handlers::authorize_analyst))
        .route("/provider_token_id", get(handlers::provider_token_id))
        .route("/analyst_token_id", get(handlers::analyst_token_id))
        .route("/has_role", get(handlers::has_role))
        .route(
            "/access_policies",
            get(handlers::get_access_policy).post(handlers::set_access_policy),
        )
        .route("/all_access_policies", get(handlers::get_all_access_policies))
        // Data
        .route("/set_data", post(handlers::set_data))
        .route("/get_data", get(handlers::get_data))
        .route("/upload_signature", post(handlers::upload_signature))
        .route("/signatures", get(handlers::get_signatures))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
