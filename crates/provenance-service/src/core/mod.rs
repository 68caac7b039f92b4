//! Proof pipeline, authorization and data services

pub mod access;
pub mod auth;
pub mod data;
pub mod error;
pub mod generator;
pub mod verifier;

pub use access::AccessPolicyManager;
pub use auth::{RequestSignature, SignedIntent};
pub use data::{DataRegistry, SignatureRecord};
pub use error::{Result, ServiceError};
pub use generator::ProofGenerator;
pub use verifier::ProofVerifier;
