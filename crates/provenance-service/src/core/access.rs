//! Role authorization and access policies
//!
//! Each role has its own token contract; an address is authorized for a role
//! once it holds a token there. Authorization is one-way and idempotent:
//! authorizing twice returns the token minted the first time. Access
//! policies live on the protocol contract, can only be written by their
//! owner, and are replaced wholesale on every write.

use provenance_contracts::catalog::{DATA_ANALYSTS_NFTS, DATA_PROVIDERS_NFTS, SCHRODINGER_PROTOCOL};
use provenance_contracts::{methods, ContractError, ContractRegistry};
use provenance_core::{AccessPolicy, Address, Role, TokenId};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::auth::{RequestSignature, SignedIntent};
use crate::core::error::{Result, ServiceError};

/// Token contract holding authorizations for a role
pub fn token_contract(role: Role) -> &'static str {
    match role {
        Role::Provider => DATA_PROVIDERS_NFTS,
        Role::Analyst => DATA_ANALYSTS_NFTS,
    }
}

pub struct AccessPolicyManager {
    contracts: Arc<ContractRegistry>,
}

impl AccessPolicyManager {
    pub fn new(contracts: Arc<ContractRegistry>) -> Self {
        Self { contracts }
    }

    /// Mint a role token for `address`, or return the one it already holds
    pub async fn authorize(&self, address: Address, role: Role) -> Result<TokenId> {
        if let Some(token_id) = self.token_of(address, role).await? {
            debug!(address = %address, role = %role, token_id = %token_id, "Already authorized");
            return Ok(token_id);
        }

        let receipt = match self
            .contracts
            .send(token_contract(role), methods::MINT, vec![json!(address)])
            .await
        {
            Ok(receipt) => receipt,
            // Lost a race with a concurrent mint for the same address
            Err(ContractError::Reverted(reason)) => {
                return self
                    .token_of(address, role)
                    .await?
                    .ok_or(ServiceError::Contract(ContractError::Reverted(reason)));
            }
            Err(e) => return Err(e.into()),
        };

        let token_id = match parse_token_id(&receipt.output) {
            Some(id) => id,
            None => self
                .token_of(address, role)
                .await?
                .ok_or_else(|| ContractError::InvalidResponse("mint returned no token id".into()))?,
        };

        info!(
            address = %address,
            role = %role,
            token_id = %token_id,
            tx = %receipt.transaction_hash,
            "Authorized address"
        );
        Ok(token_id)
    }

    pub async fn has_role(&self, address: Address, role: Role) -> Result<bool> {
        Ok(self.token_of(address, role).await?.is_some())
    }

    pub async fn get_token_id(&self, address: Address, role: Role) -> Result<TokenId> {
        self.token_of(address, role)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} token for {}", role, address)))
    }

    /// Every role `address` holds
    pub async fn roles_of(&self, address: Address) -> Result<Vec<Role>> {
        let mut roles = Vec::new();
        for role in Role::ALL {
            if self.has_role(address, role).await? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Fail with `MissingRole` unless `address` holds `role`
    pub async fn require_role(&self, address: Address, role: Role) -> Result<()> {
        if self.has_role(address, role).await? {
            Ok(())
        } else {
            Err(ServiceError::MissingRole { address, role })
        }
    }

    /// Replace the access policy of `owner`. Only the owner may write it.
    ///
    /// The caller is the signer of `auth`, never an address taken from the
    /// request body.
    pub async fn set_access_policy(
        &self,
        owner: Address,
        policy: AccessPolicy,
        auth: &RequestSignature,
    ) -> Result<()> {
        let intent = SignedIntent::SetAccessPolicy {
            owner,
            policy: &policy,
        };
        let caller = auth.verify(&intent, Utc::now())?;
        if caller != owner {
            warn!(caller = %caller, owner = %owner, "Rejected access policy write");
            return Err(ServiceError::UnauthorizedWrite { caller, owner });
        }

        let policy_json = serde_json::to_value(&policy).map_err(ContractError::from)?;
        self.contracts
            .send(
                SCHRODINGER_PROTOCOL,
                methods::SET_ACCESS_POLICY,
                vec![json!(owner), policy_json],
            )
            .await?;

        info!(
            owner = %owner,
            addresses = policy.addresses.len(),
            roles = policy.roles.len(),
            "Access policy updated"
        );
        Ok(())
    }

    /// Policy of `owner`; empty when none was set
    pub async fn get_access_policy(&self, owner: Address) -> Result<AccessPolicy> {
        let value = self
            .contracts
            .call(SCHRODINGER_PROTOCOL, methods::GET_ACCESS_POLICY, vec![json!(owner)])
            .await?;
        if value.is_null() {
            return Ok(AccessPolicy::default());
        }
        Ok(serde_json::from_value(value).map_err(ContractError::from)?)
    }

    pub async fn get_all_access_policies(&self) -> Result<BTreeMap<Address, AccessPolicy>> {
        let value = self
            .contracts
            .call(SCHRODINGER_PROTOCOL, methods::GET_ALL_ACCESS_POLICIES, vec![])
            .await?;
        Ok(serde_json::from_value(value).map_err(ContractError::from)?)
    }

    /// Whether `requester` may read the data of `owner`.
    ///
    /// `requester` must already be authenticated.
    pub async fn permits(&self, owner: Address, requester: Address) -> Result<bool> {
        if owner == requester {
            return Ok(true);
        }
        let roles = self.roles_of(requester).await?;
        if !roles.contains(&Role::Analyst) {
            return Ok(false);
        }
        let policy = self.get_access_policy(owner).await?;
        Ok(policy.permits(&requester, &roles))
    }

    async fn token_of(&self, address: Address, role: Role) -> Result<Option<TokenId>> {
        let value = self
            .contracts
            .call(token_contract(role), methods::TOKEN_OF, vec![json!(address)])
            .await?;
        Ok(parse_token_id(&value))
    }
}

fn parse_token_id(value: &Value) -> Option<TokenId> {
    match value {
        Value::Number(n) => n.as_u64().map(TokenId),
        Value::String(s) => s.parse().ok().map(TokenId),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::now_unix;
    use provenance_contracts::{
        ContractCatalog, DevChain, MemoryDeploymentStore, RegistryConfig,
    };
    use provenance_core::KeyPair;

    /// Sign a policy write for `owner` with `signer`
    fn signed_write(signer: &KeyPair, owner: Address, policy: &AccessPolicy) -> RequestSignature {
        RequestSignature::sign(
            signer,
            &SignedIntent::SetAccessPolicy { owner, policy },
            now_unix(),
        )
        .unwrap()
    }

    async fn manager() -> AccessPolicyManager {
        let contracts = ContractRegistry::new(
            RegistryConfig::ephemeral("development"),
            ContractCatalog::standard().unwrap(),
            Arc::new(DevChain::new()),
            Arc::new(MemoryDeploymentStore::new()),
        )
        .unwrap();
        contracts.initialize().await.unwrap();
        AccessPolicyManager::new(Arc::new(contracts))
    }

    #[tokio::test]
    async fn test_authorize_is_idempotent() {
        let manager = manager().await;
        let alice = Address::new([0xa1; 20]);

        assert!(!manager.has_role(alice, Role::Provider).await.unwrap());
        let first = manager.authorize(alice, Role::Provider).await.unwrap();
        let second = manager.authorize(alice, Role::Provider).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.get_token_id(alice, Role::Provider).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_roles_are_disjoint() {
        let manager = manager().await;
        let alice = Address::new([0xa1; 20]);

        manager.authorize(alice, Role::Analyst).await.unwrap();
        assert!(manager.has_role(alice, Role::Analyst).await.unwrap());
        assert!(!manager.has_role(alice, Role::Provider).await.unwrap());
        assert!(matches!(
            manager.get_token_id(alice, Role::Provider).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(manager.roles_of(alice).await.unwrap(), vec![Role::Analyst]);
    }

    #[tokio::test]
    async fn test_policy_is_self_service() {
        let manager = manager().await;
        let alice_key = KeyPair::generate();
        let bob_key = KeyPair::generate();
        let alice = alice_key.address();
        let policy = AccessPolicy::new().allow_address(bob_key.address());

        // Bob signs a write of Alice's policy with his own key
        let err = manager
            .set_access_policy(alice, policy.clone(), &signed_write(&bob_key, alice, &policy))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnauthorizedWrite { caller, .. } if caller == bob_key.address()));
        assert!(manager.get_access_policy(alice).await.unwrap().is_empty());

        manager
            .set_access_policy(alice, policy.clone(), &signed_write(&alice_key, alice, &policy))
            .await
            .unwrap();
        assert_eq!(manager.get_access_policy(alice).await.unwrap(), policy);

        // Writes replace the whole policy
        let replacement = AccessPolicy::new().allow_role(Role::Analyst);
        manager
            .set_access_policy(
                alice,
                replacement.clone(),
                &signed_write(&alice_key, alice, &replacement),
            )
            .await
            .unwrap();
        let all = manager.get_all_access_policies().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(&alice), Some(&replacement));
    }

    #[tokio::test]
    async fn test_policy_write_with_borrowed_public_key_rejected() {
        let manager = manager().await;
        let victim = KeyPair::generate();
        let attacker = KeyPair::generate();
        let owner = victim.address();
        let policy = AccessPolicy::new().allow_address(attacker.address());

        // Victim's public key, attacker's signature
        let mut auth = signed_write(&attacker, owner, &policy);
        auth.public_key = victim.public_key().to_hex();

        let err = manager
            .set_access_policy(owner, policy, &auth)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSignature(_)));
        assert!(manager.get_access_policy(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signed_policy_cannot_be_widened() {
        let manager = manager().await;
        let owner_key = KeyPair::generate();
        let owner = owner_key.address();
        let signed_policy = AccessPolicy::new().allow_role(Role::Analyst);
        let auth = signed_write(&owner_key, owner, &signed_policy);

        let widened = signed_policy.clone().allow_address(Address::new([0xee; 20]));
        assert!(matches!(
            manager.set_access_policy(owner, widened, &auth).await,
            Err(ServiceError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_permits_requires_analyst_and_policy() {
        let manager = manager().await;
        let owner_key = KeyPair::generate();
        let owner = owner_key.address();
        let analyst = Address::new([2; 20]);

        assert!(manager.permits(owner, owner).await.unwrap());
        assert!(!manager.permits(owner, analyst).await.unwrap());

        let policy = AccessPolicy::new().allow_address(analyst);
        manager
            .set_access_policy(owner, policy.clone(), &signed_write(&owner_key, owner, &policy))
            .await
            .unwrap();
        // Listed but not an analyst yet
        assert!(!manager.permits(owner, analyst).await.unwrap());

        manager.authorize(analyst, Role::Analyst).await.unwrap();
        assert!(manager.permits(owner, analyst).await.unwrap());
    }
}
