//! Common types used across the provenance pipeline

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::encoding::decode_hex_field;
use crate::error::{ProvenanceError, Result};

/// A 20-byte account or contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Address length in bytes
    pub const LEN: usize = 20;

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an address from the trailing 20 bytes of a 32-byte digest
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// Get the raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a `0x`-prefixed (or bare) hex address
    pub fn parse(value: &str) -> Result<Self> {
        let bytes = decode_hex_field("address", value)?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            ProvenanceError::MalformedInput(format!(
                "address must be {} bytes, got {}",
                Self::LEN,
                b.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Address::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// Authorization roles. Each role is backed by its own token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Data provider
    Provider,
    /// Data analyst
    Analyst,
}

impl Role {
    /// All roles, in a stable order
    pub const ALL: [Role; 2] = [Role::Provider, Role::Analyst];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Provider => "provider",
            Role::Analyst => "analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "provider" => Ok(Role::Provider),
            "analyst" => Ok(Role::Analyst),
            other => Err(ProvenanceError::MalformedInput(format!("unknown role '{}'", other))),
        }
    }
}

/// Identifier of a minted authorization token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which counterparts may read an address's data.
///
/// An empty policy denies everyone except the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Explicitly permitted counterpart addresses
    #[serde(default)]
    pub addresses: BTreeSet<Address>,

    /// Roles whose holders are permitted
    #[serde(default)]
    pub roles: BTreeSet<Role>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit a specific address
    pub fn allow_address(mut self, address: Address) -> Self {
        self.addresses.insert(address);
        self
    }

    /// Permit every holder of a role
    pub fn allow_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.roles.is_empty()
    }

    /// Check whether a requester holding `held_roles` may access the data
    pub fn permits(&self, requester: &Address, held_roles: &[Role]) -> bool {
        self.addresses.contains(requester) || held_roles.iter().any(|r| self.roles.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_and_display() {
        let addr = Address::parse("0xAbCdEf0123456789aBcDeF0123456789AbCdEf01").unwrap();
        assert_eq!(addr.to_string(), "0xabcdef0123456789abcdef0123456789abcdef01");

        let bare: Address = "abcdef0123456789abcdef0123456789abcdef01".parse().unwrap();
        assert_eq!(addr, bare);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        let err = Address::parse("0x1234").unwrap_err();
        assert!(matches!(err, ProvenanceError::MalformedInput(_)));
    }

    #[test]
    fn test_address_serde_roundtrip() {
        let addr = Address::new([7u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "07".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Provider".parse::<Role>().unwrap(), Role::Provider);
        assert_eq!("analyst".parse::<Role>().unwrap(), Role::Analyst);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_policy_defaults_to_deny() {
        let policy = AccessPolicy::default();
        let requester = Address::new([1u8; 20]);
        assert!(policy.is_empty());
        assert!(!policy.permits(&requester, &[Role::Analyst]));
    }

    #[test]
    fn test_policy_permits_by_address_or_role() {
        let alice = Address::new([1u8; 20]);
        let bob = Address::new([2u8; 20]);

        let policy = AccessPolicy::new().allow_address(alice).allow_role(Role::Provider);

        assert!(policy.permits(&alice, &[]));
        assert!(!policy.permits(&bob, &[Role::Analyst]));
        assert!(policy.permits(&bob, &[Role::Analyst, Role::Provider]));
    }
}
