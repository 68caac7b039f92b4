//! Key Registry
//!
//! Manages:
//! - The service's signing accounts (random in development, configured in
//!   production)
//! - Public keys published per address on the protocol contract
//! - Signatures over caller-supplied hashes and messages

use provenance_contracts::catalog::SCHRODINGER_PROTOCOL;
use provenance_contracts::{methods, ContractRegistry};
use provenance_core::encoding::decode_hex_field;
use provenance_core::{Address, KeyPair, PublicKey};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::config::Environment;
use crate::core::error::{Result, ServiceError};

/// A freshly generated key pair
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedKeyPair {
    pub private_key: String,
    pub public_key: String,
    pub address: Address,
}

/// Signature over a hash together with what is needed to check it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedHash {
    pub account: Address,
    /// keccak-256 digest that was signed
    pub hash: String,
    /// r ‖ s
    pub signature: String,
    pub public_key: String,
}

pub struct KeyRegistry {
    environment: Environment,
    contracts: Arc<ContractRegistry>,
    accounts: RwLock<Vec<KeyPair>>,
}

impl KeyRegistry {
    pub fn new(environment: Environment, contracts: Arc<ContractRegistry>, accounts: Vec<KeyPair>) -> Self {
        info!(accounts = accounts.len(), "Key registry initialized");
        Self {
            environment,
            contracts,
            accounts: RwLock::new(accounts),
        }
    }

    /// `count` random signing accounts
    pub fn development_accounts(count: usize) -> Vec<KeyPair> {
        (0..count).map(|_| KeyPair::generate()).collect()
    }

    pub fn generate_key_pair() -> GeneratedKeyPair {
        let key_pair = KeyPair::generate();
        GeneratedKeyPair {
            private_key: key_pair.private_key_hex(),
            public_key: key_pair.public_key().to_hex(),
            address: key_pair.address(),
        }
    }

    // =========================================================================
    // Signing Accounts
    // =========================================================================

    pub fn list_accounts(&self) -> Vec<Address> {
        let accounts = self.accounts.read().unwrap_or_else(|p| p.into_inner());
        accounts.iter().map(KeyPair::address).collect()
    }

    /// Replace every signing account with a fresh one (development only)
    pub fn reset_accounts(&self) -> Result<Vec<Address>> {
        self.ensure_development("reset_accounts")?;

        let mut accounts = self.accounts.write().unwrap_or_else(|p| p.into_inner());
        let count = accounts.len();
        *accounts = Self::development_accounts(count);
        info!(accounts = count, "Signing accounts regenerated");
        Ok(accounts.iter().map(KeyPair::address).collect())
    }

    /// Sign a 32-byte hash (hex) with one of the service's accounts
    pub fn sign_hash(&self, account: Address, hash: &str) -> Result<SignedHash> {
        let hash = decode_hex_field("hash", hash)?;
        let key_pair = self.account(account)?;
        let signature = key_pair.sign_hash(&hash)?;
        Ok(SignedHash {
            account,
            hash: format!("0x{}", hex::encode(&hash)),
            signature: format!("0x{}", hex::encode(signature)),
            public_key: key_pair.public_key().to_hex(),
        })
    }

    /// Hash a UTF-8 message with keccak-256, then sign the digest
    pub fn sign_message(&self, account: Address, message: &str) -> Result<SignedHash> {
        let key_pair = self.account(account)?;
        let (hash, signature) = key_pair.sign_message(message.as_bytes())?;
        Ok(SignedHash {
            account,
            hash: format!("0x{}", hex::encode(hash)),
            signature: format!("0x{}", hex::encode(signature)),
            public_key: key_pair.public_key().to_hex(),
        })
    }

    fn account(&self, address: Address) -> Result<KeyPair> {
        let accounts = self.accounts.read().unwrap_or_else(|p| p.into_inner());
        accounts
            .iter()
            .find(|kp| kp.address() == address)
            .cloned()
            .ok_or(ServiceError::UnknownAccount(address))
    }

    // =========================================================================
    // Published Public Keys
    // =========================================================================

    /// Publish the public key of `address` (overwrites)
    pub async fn set_public_key(&self, address: Address, key: &PublicKey) -> Result<()> {
        self.contracts
            .send(
                SCHRODINGER_PROTOCOL,
                methods::SET_PUBLIC_KEY,
                vec![json!(address), json!(key.to_hex())],
            )
            .await?;
        info!(address = %address, "Public key updated");
        Ok(())
    }

    pub async fn get_public_key(&self, address: Address) -> Result<PublicKey> {
        let value = self
            .contracts
            .call(SCHRODINGER_PROTOCOL, methods::GET_PUBLIC_KEY, vec![json!(address)])
            .await?;
        match value {
            Value::String(key) if !key.is_empty() => Ok(PublicKey::from_hex(&key)?),
            _ => Err(ServiceError::NotFound(format!("public key of {}", address))),
        }
    }

    /// Clear every published public key (development only)
    pub async fn reset_all(&self) -> Result<()> {
        self.ensure_development("reset_public_keys")?;
        self.contracts
            .send(SCHRODINGER_PROTOCOL, methods::RESET_PUBLIC_KEYS, vec![])
            .await?;
        info!("Public keys reset");
        Ok(())
    }

    fn ensure_development(&self, operation: &'static str) -> Result<()> {
        match self.environment {
            Environment::Development => Ok(()),
            Environment::Production => Err(ServiceError::ForbiddenInProduction(operation)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenance_contracts::{ContractCatalog, DevChain, MemoryDeploymentStore, RegistryConfig};
    use provenance_core::ProvenanceError;

    async fn registry(environment: Environment, accounts: usize) -> KeyRegistry {
        let contracts = ContractRegistry::new(
            RegistryConfig::ephemeral("development"),
            ContractCatalog::standard().unwrap(),
            Arc::new(DevChain::new()),
            Arc::new(MemoryDeploymentStore::new()),
        )
        .unwrap();
        contracts.initialize().await.unwrap();
        KeyRegistry::new(
            environment,
            Arc::new(contracts),
            KeyRegistry::development_accounts(accounts),
        )
    }

    #[tokio::test]
    async fn test_sign_hash_verifies() {
        let registry = registry(Environment::Development, 2).await;
        let account = registry.list_accounts()[0];

        let signed = registry.sign_hash(account, &"ab".repeat(32)).unwrap();
        let public_key = PublicKey::from_hex(&signed.public_key).unwrap();
        let signature = decode_hex_field("signature", &signed.signature).unwrap();

        assert_eq!(public_key.address(), account);
        assert!(public_key.verify_hash(&[0xab; 32], &signature));
    }

    #[tokio::test]
    async fn test_sign_hash_rejects_short_hash_and_unknown_account() {
        let registry = registry(Environment::Development, 1).await;
        let account = registry.list_accounts()[0];

        assert!(matches!(
            registry.sign_hash(account, "0xab34"),
            Err(ServiceError::Provenance(ProvenanceError::MalformedInput(_)))
        ));
        assert!(matches!(
            registry.sign_hash(Address::new([0; 20]), &"00".repeat(32)),
            Err(ServiceError::UnknownAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_message_returns_keccak_digest() {
        let registry = registry(Environment::Development, 1).await;
        let account = registry.list_accounts()[0];

        let signed = registry.sign_message(account, "").unwrap();
        assert_eq!(
            signed.hash,
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[tokio::test]
    async fn test_reset_accounts_only_in_development() {
        let dev = registry(Environment::Development, 3).await;
        let before = dev.list_accounts();
        let after = dev.reset_accounts().unwrap();
        assert_eq!(after.len(), 3);
        assert_ne!(before, after);

        let prod = registry(Environment::Production, 1).await;
        assert!(matches!(
            prod.reset_accounts(),
            Err(ServiceError::ForbiddenInProduction(_))
        ));
        assert!(matches!(
            prod.reset_all().await,
            Err(ServiceError::ForbiddenInProduction(_))
        ));
    }

    #[tokio::test]
    async fn test_public_key_overwrite_and_reset() {
        let registry = registry(Environment::Development, 0).await;
        let owner = Address::new([7; 20]);
        let first = KeyPair::generate();
        let second = KeyPair::generate();

        assert!(matches!(
            registry.get_public_key(owner).await,
            Err(ServiceError::NotFound(_))
        ));

        registry.set_public_key(owner, first.public_key()).await.unwrap();
        registry.set_public_key(owner, second.public_key()).await.unwrap();
        assert_eq!(&registry.get_public_key(owner).await.unwrap(), second.public_key());

        registry.reset_all().await.unwrap();
        assert!(matches!(
            registry.get_public_key(owner).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
