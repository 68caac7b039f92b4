//! Provenance Service
//!
//! HTTP service that lets data providers prove they hold a signature over a
//! data hash without revealing their key, and gates data access by role
//! tokens and per-address access policies.
//!
//! ## Startup Order
//!
//! 1. Resolve every contract on the configured network (deploy on the
//!    ephemeral network, load recorded addresses on persisted ones)
//! 2. Start serving; proof generation answers `NOT_READY` meanwhile
//! 3. Load the circuit artifacts the verifier contracts reference
//!
//! ## API Endpoints
//!
//! ### Proofs
//! - `POST /generate_proof` - Encode statement material and prove it
//! - `POST /verify_public_inputs` - Compare a proof's signals with claimed material
//! - `POST /verify_proof` - Verify a proof with the on-chain verifier
//! - `GET /available_functions` - Verifier contracts and their circuits
//!
//! ### Authorization
//! - `POST /authorize_provider`, `POST /authorize_analyst` - Mint a role token
//! - `GET /provider_token_id`, `GET /analyst_token_id`, `GET /has_role`
//! - `POST /access_policies`, `GET /access_policies`, `GET /all_access_policies`
//!
//! ### Keys and Data
//! - `GET /accounts`, `GET /reset_accounts`, `GET /key_pair`
//! - `POST /sign_hash`, `POST /sign_message`
//! - `GET /publickey`, `PUT /publickey`, `GET /reset_public_keys`
//! - `POST /set_data`, `GET /get_data`, `POST /upload_signature`, `GET /signatures`

pub mod api;
pub mod config;
pub mod core;
pub mod keys;
pub mod lifecycle;
pub mod state;

pub use api::create_router;
pub use config::{ConfigError, Environment, ServiceConfig};
pub use core::{ServiceError, Result};
pub use keys::KeyRegistry;
pub use lifecycle::{serve_until, shutdown_signal, ShutdownConfig, ShutdownOutcome};
pub use state::AppState;
