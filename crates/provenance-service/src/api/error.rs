//! API error types and responses

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use provenance_contracts::ContractError;
use provenance_core::ProvenanceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::core::ServiceError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Proving failed: {0}")]
    Proving(String),

    #[error("Verification call failed: {0}")]
    VerificationCall(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Unauthorized write: {0}")]
    UnauthorizedWrite(String),

    #[error("Forbidden in production: {0}")]
    ForbiddenInProduction(String),

    #[error("Missing role: {0}")]
    MissingRole(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Proving(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::VerificationCall(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            ApiError::UnauthorizedWrite(_)
            | ApiError::ForbiddenInProduction(_)
            | ApiError::MissingRole(_)
            | ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MalformedInput(_) => "MALFORMED_INPUT",
            ApiError::NotReady(_) => "NOT_READY",
            ApiError::Proving(_) => "PROVING_ERROR",
            ApiError::VerificationCall(_) => "VERIFICATION_CALL_ERROR",
            ApiError::InvalidSignature(_) => "INVALID_SIGNATURE",
            ApiError::UnauthorizedWrite(_) => "UNAUTHORIZED_WRITE",
            ApiError::ForbiddenInProduction(_) => "FORBIDDEN_IN_PRODUCTION",
            ApiError::MissingRole(_) => "MISSING_ROLE",
            ApiError::AccessDenied(_) => "ACCESS_DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::MalformedInput(msg)
            | ApiError::NotReady(msg)
            | ApiError::Proving(msg)
            | ApiError::VerificationCall(msg)
            | ApiError::InvalidSignature(msg)
            | ApiError::UnauthorizedWrite(msg)
            | ApiError::ForbiddenInProduction(msg)
            | ApiError::MissingRole(msg)
            | ApiError::AccessDenied(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.message(),
            code: self.code().to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Provenance(e) => e.into(),
            ServiceError::Contract(e) => e.into(),
            ServiceError::VerificationCall(msg) => ApiError::VerificationCall(msg),
            ServiceError::InvalidSignature(_) => ApiError::InvalidSignature(message),
            ServiceError::UnauthorizedWrite { .. } => ApiError::UnauthorizedWrite(message),
            ServiceError::MissingRole { .. } => ApiError::MissingRole(message),
            ServiceError::AccessDenied { .. } => ApiError::AccessDenied(message),
            ServiceError::ForbiddenInProduction(_) => ApiError::ForbiddenInProduction(message),
            ServiceError::NotFound(_) | ServiceError::UnknownAccount(_) => ApiError::NotFound(message),
        }
    }
}

impl From<ProvenanceError> for ApiError {
    fn from(err: ProvenanceError) -> Self {
        match err {
            ProvenanceError::MalformedInput(msg) => ApiError::MalformedInput(msg),
            // Key material that is not a curve point comes from the request
            ProvenanceError::CryptoError(msg) => ApiError::MalformedInput(msg),
            ProvenanceError::NotReady(msg) => ApiError::NotReady(msg),
            ProvenanceError::Proving(msg) => ApiError::Proving(msg),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ContractError> for ApiError {
    fn from(err: ContractError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}
