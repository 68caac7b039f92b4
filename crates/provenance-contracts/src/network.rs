//! Named networks

/// A network the service knows how to target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: &'static str,
    pub chain_id: u64,
    /// Default chain gateway endpoint
    pub endpoint: &'static str,
    /// Recreated every run; contracts are deployed at startup
    pub ephemeral: bool,
}

pub const DEVELOPMENT: &str = "development";

pub const NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: DEVELOPMENT,
        chain_id: 1337,
        endpoint: "",
        ephemeral: true,
    },
    NetworkInfo {
        name: "sepolia",
        chain_id: 11_155_111,
        endpoint: "https://eth-sepolia.g.alchemy.com/v2",
        ephemeral: false,
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: 84_532,
        endpoint: "https://sepolia.base.org",
        ephemeral: false,
    },
    NetworkInfo {
        name: "zkevm-cardona",
        chain_id: 2_442,
        endpoint: "https://rpc.cardona.zkevm-rpc.com",
        ephemeral: false,
    },
];

/// Look up a network by name
pub fn lookup(name: &str) -> Option<&'static NetworkInfo> {
    NETWORKS.iter().find(|n| n.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(lookup(DEVELOPMENT).unwrap().ephemeral);
        assert_eq!(lookup("base-sepolia").unwrap().chain_id, 84_532);
        assert!(lookup("mainnet").is_none());
    }
}
