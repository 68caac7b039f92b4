//! Data records and signature uploads
//!
//! Providers publish a data-source descriptor and a log of signed hashes on
//! the protocol contract. Reads of another address's descriptor go through
//! the owner's access policy.

use provenance_contracts::catalog::SCHRODINGER_PROTOCOL;
use provenance_contracts::{methods, ContractError, ContractRegistry};
use provenance_core::encoding::decode_hex_field;
use chrono::Utc;
use provenance_core::{Address, Role};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::access::AccessPolicyManager;
use crate::core::auth::{RequestSignature, SignedIntent};
use crate::core::error::{Result, ServiceError};

/// One uploaded signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub hash: String,
    pub signature: String,
}

pub struct DataRegistry {
    contracts: Arc<ContractRegistry>,
    access: Arc<AccessPolicyManager>,
}

impl DataRegistry {
    pub fn new(contracts: Arc<ContractRegistry>, access: Arc<AccessPolicyManager>) -> Self {
        Self { contracts, access }
    }

    /// Publish the data descriptor of a provider (overwrites)
    pub async fn set_data(&self, address: Address, data: Value) -> Result<()> {
        self.access.require_role(address, Role::Provider).await?;
        self.contracts
            .send(SCHRODINGER_PROTOCOL, methods::SET_DATA, vec![json!(address), data])
            .await?;
        info!(owner = %address, "Data descriptor updated");
        Ok(())
    }

    /// Read the descriptor of `owner` on behalf of `requester`.
    ///
    /// `auth` must be the requester's signature over this read.
    pub async fn get_data(
        &self,
        owner: Address,
        requester: Address,
        auth: &RequestSignature,
    ) -> Result<Value> {
        let signer = auth.verify(&SignedIntent::GetData { owner, requester }, Utc::now())?;
        if signer != requester {
            warn!(owner = %owner, requester = %requester, signer = %signer, "Read signed by another address");
            return Err(ServiceError::AccessDenied { owner, requester });
        }

        if !self.access.permits(owner, requester).await? {
            warn!(owner = %owner, requester = %requester, "Data access denied");
            return Err(ServiceError::AccessDenied { owner, requester });
        }

        let data = self
            .contracts
            .call(SCHRODINGER_PROTOCOL, methods::GET_DATA, vec![json!(owner)])
            .await?;
        if data.is_null() {
            return Err(ServiceError::NotFound(format!("data of {}", owner)));
        }
        Ok(data)
    }

    /// Append a signed hash to a provider's log, returning the log length
    pub async fn upload_signature(
        &self,
        address: Address,
        hash: &str,
        signature: &str,
    ) -> Result<usize> {
        decode_hex_field("hash", hash)?;
        decode_hex_field("signature", signature)?;
        self.access.require_role(address, Role::Provider).await?;

        let receipt = self
            .contracts
            .send(
                SCHRODINGER_PROTOCOL,
                methods::UPLOAD_SIGNATURE,
                vec![json!(address), json!(hash), json!(signature)],
            )
            .await?;

        let count = receipt.output.as_u64().unwrap_or_default() as usize;
        info!(owner = %address, count, "Signature uploaded");
        Ok(count)
    }

    pub async fn get_signatures(&self, address: Address) -> Result<Vec<SignatureRecord>> {
        let value = self
            .contracts
            .call(SCHRODINGER_PROTOCOL, methods::GET_SIGNATURES, vec![json!(address)])
            .await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value).map_err(ContractError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::now_unix;
    use provenance_contracts::{ContractCatalog, DevChain, MemoryDeploymentStore, RegistryConfig};
    use provenance_core::{AccessPolicy, KeyPair, ProvenanceError};

    async fn setup() -> (Arc<AccessPolicyManager>, DataRegistry) {
        let contracts = ContractRegistry::new(
            RegistryConfig::ephemeral("development"),
            ContractCatalog::standard().unwrap(),
            Arc::new(DevChain::new()),
            Arc::new(MemoryDeploymentStore::new()),
        )
        .unwrap();
        contracts.initialize().await.unwrap();
        let contracts = Arc::new(contracts);
        let access = Arc::new(AccessPolicyManager::new(contracts.clone()));
        let data = DataRegistry::new(contracts, access.clone());
        (access, data)
    }

    fn signed_read(signer: &KeyPair, owner: Address, requester: Address) -> RequestSignature {
        RequestSignature::sign(signer, &SignedIntent::GetData { owner, requester }, now_unix())
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_data_requires_provider() {
        let (access, data) = setup().await;
        let provider_key = KeyPair::generate();
        let provider = provider_key.address();

        let err = data.set_data(provider, json!({"url": "s3://bucket"})).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingRole { role: Role::Provider, .. }));

        access.authorize(provider, Role::Provider).await.unwrap();
        data.set_data(provider, json!({"url": "s3://bucket"})).await.unwrap();
        assert_eq!(
            data.get_data(provider, provider, &signed_read(&provider_key, provider, provider))
                .await
                .unwrap(),
            json!({"url": "s3://bucket"})
        );
    }

    #[tokio::test]
    async fn test_get_data_policy_gating() {
        let (access, data) = setup().await;
        let provider_key = KeyPair::generate();
        let analyst_key = KeyPair::generate();
        let provider = provider_key.address();
        let analyst = analyst_key.address();
        access.authorize(provider, Role::Provider).await.unwrap();
        access.authorize(analyst, Role::Analyst).await.unwrap();

        assert!(matches!(
            data.get_data(provider, provider, &signed_read(&provider_key, provider, provider))
                .await,
            Err(ServiceError::NotFound(_))
        ));

        data.set_data(provider, json!("ipfs://cid")).await.unwrap();
        let read = signed_read(&analyst_key, provider, analyst);
        assert!(matches!(
            data.get_data(provider, analyst, &read).await,
            Err(ServiceError::AccessDenied { .. })
        ));

        let policy = AccessPolicy::new().allow_role(Role::Analyst);
        let auth = RequestSignature::sign(
            &provider_key,
            &SignedIntent::SetAccessPolicy { owner: provider, policy: &policy },
            now_unix(),
        )
        .unwrap();
        access.set_access_policy(provider, policy, &auth).await.unwrap();
        assert_eq!(data.get_data(provider, analyst, &read).await.unwrap(), json!("ipfs://cid"));
    }

    #[tokio::test]
    async fn test_requester_cannot_impersonate_owner() {
        let (access, data) = setup().await;
        let provider_key = KeyPair::generate();
        let provider = provider_key.address();
        let outsider = KeyPair::generate();
        access.authorize(provider, Role::Provider).await.unwrap();
        data.set_data(provider, json!({"uri": "s3://secret"})).await.unwrap();

        // Claims to be the owner, signs with its own key
        let forged = signed_read(&outsider, provider, provider);
        assert!(matches!(
            data.get_data(provider, provider, &forged).await,
            Err(ServiceError::AccessDenied { .. })
        ));

        // Claims to be the owner, borrows the owner's public key
        let mut borrowed = forged.clone();
        borrowed.public_key = provider_key.public_key().to_hex();
        assert!(matches!(
            data.get_data(provider, provider, &borrowed).await,
            Err(ServiceError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_signature_log() {
        let (access, data) = setup().await;
        let provider = Address::new([1; 20]);
        access.authorize(provider, Role::Provider).await.unwrap();

        assert!(data.get_signatures(provider).await.unwrap().is_empty());
        assert_eq!(data.upload_signature(provider, "0xab", "0xcd").await.unwrap(), 1);
        assert_eq!(data.upload_signature(provider, "0x12", "0x34").await.unwrap(), 2);

        let log = data.get_signatures(provider).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].hash, "0xab");

        let err = data.upload_signature(provider, "0xabc", "0xcd").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Provenance(ProvenanceError::MalformedInput(_))
        ));
    }
}
