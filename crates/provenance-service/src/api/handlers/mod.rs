//! API request handlers

pub mod accounts;
pub mod authorization;
pub mod data;
pub mod keys;
pub mod proof;

use provenance_core::Address;
use serde::Deserialize;

pub use accounts::{list_accounts, reset_accounts, AccountsResponse};
pub use authorization::{
    analyst_token_id, authorize_analyst, authorize_provider, get_access_policy,
    get_all_access_policies, has_role, provider_token_id, set_access_policy,
    AccessPolicyResponse, AllAccessPoliciesResponse, AuthorizeRequest, HasRoleResponse,
    SetAccessPolicyRequest, TokenResponse,
};
pub use data::{
    get_data, get_signatures, set_data, upload_signature, DataResponse, SignaturesResponse,
    UploadSignatureResponse,
};
pub use keys::{
    generate_key_pair, get_public_key, reset_public_keys, set_public_key, sign_hash, sign_message,
    PublicKeyResponse, SignHashRequest, SignMessageRequest,
};
pub use proof::{
    generate_proof, verify_proof, verify_public_inputs, GenerateProofRequest,
    GenerateProofResponse, VerificationResponse, VerifyProofRequest,
};

/// `?address=0x...`
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: Address,
}
