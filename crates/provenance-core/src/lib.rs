//! # Provenance Core
//!
//! Types and primitives for proving provenance of signed data without
//! revealing the signing key.
//!
//! ## Key Concepts
//!
//! - **Provenance claim**: a signature over a data hash, produced by the
//!   holder of a public key
//! - **Circuit input vector**: the byte-exact public/private input layout a
//!   circuit expects, derived from the claim by [`StatementPurpose::encode`]
//! - **Proof**: an opaque blob plus the public signals it is bound to
//! - **Proving backend**: the external procedure turning inputs into proofs
//!
//! Verifier contracts compare public signals by exact equality, so encoding
//! must be deterministic.

pub mod crypto;
pub mod encoding;
pub mod error;
pub mod proof;
pub mod prover;
pub mod types;

pub use crypto::{keccak256, KeyPair, PublicKey};
pub use encoding::{CircuitInputVector, FieldElement, ProvenanceWitness, RawArgs, StatementPurpose};
pub use error::{ProvenanceError, Result};
pub use proof::Proof;
pub use prover::{CircuitHandle, DigestProver, ProvingBackend, SCHNORR_CIRCUIT};
pub use types::{AccessPolicy, Address, Role, TokenId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
