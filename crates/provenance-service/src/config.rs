//! Service configuration
//!
//! Read once from the environment by the binary and passed explicitly into
//! every component.

use provenance_contracts::network::{self, NetworkInfo, DEVELOPMENT};
use provenance_contracts::RegistryConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Errors in the service configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Production mode cannot target the development network")]
    DevelopmentNetworkInProduction,

    #[error("Network {0} has no default chain endpoint; set PROVENANCE_CHAIN_URL")]
    MissingChainUrl(String),
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub network: String,
    pub port: u16,
    pub log_level: Level,
    /// Deployment record file
    pub deployments_path: PathBuf,
    /// In production, deploy and record instead of loading recorded addresses
    pub deploy_contracts: bool,
    pub chain_url: Option<String>,
    pub private_key: Option<String>,
    pub dev_accounts: usize,
    /// First shutdown window: in-flight requests may finish
    pub drain_grace: Duration,
    /// Second shutdown window: remaining connections are closed
    pub force_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            network: DEVELOPMENT.to_string(),
            port: 3000,
            log_level: Level::INFO,
            deployments_path: PathBuf::from("build/deployed-addresses.json"),
            deploy_contracts: false,
            chain_url: None,
            private_key: None,
            dev_accounts: 10,
            drain_grace: Duration::from_secs(5),
            force_grace: Duration::from_secs(95),
        }
    }
}

impl ServiceConfig {
    /// Read `PROVENANCE_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = match lookup("PROVENANCE_ENV") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PROVENANCE_ENV",
                value,
            })?,
            None => defaults.environment,
        };

        let network = match environment {
            // Development always runs against the ephemeral network
            Environment::Development => DEVELOPMENT.to_string(),
            Environment::Production => {
                let name = lookup("PROVENANCE_NETWORK").unwrap_or(defaults.network);
                let info = network::lookup(&name).ok_or_else(|| ConfigError::UnknownNetwork(name.clone()))?;
                if info.ephemeral {
                    return Err(ConfigError::DevelopmentNetworkInProduction);
                }
                name
            }
        };

        let config = Self {
            environment,
            network,
            port: parse_var(&lookup, "PROVENANCE_PORT", defaults.port)?,
            log_level: parse_var(&lookup, "PROVENANCE_LOG_LEVEL", defaults.log_level)?,
            deployments_path: lookup("PROVENANCE_DEPLOYMENTS")
                .map(PathBuf::from)
                .unwrap_or(defaults.deployments_path),
            deploy_contracts: parse_var(&lookup, "PROVENANCE_DEPLOY_CONTRACTS", defaults.deploy_contracts)?,
            chain_url: lookup("PROVENANCE_CHAIN_URL").filter(|s| !s.is_empty()),
            private_key: lookup("PROVENANCE_PRIVATE_KEY").filter(|s| !s.is_empty()),
            dev_accounts: parse_var(&lookup, "PROVENANCE_DEV_ACCOUNTS", defaults.dev_accounts)?,
            drain_grace: Duration::from_secs(parse_var(
                &lookup,
                "PROVENANCE_DRAIN_GRACE_SECS",
                defaults.drain_grace.as_secs(),
            )?),
            force_grace: Duration::from_secs(parse_var(
                &lookup,
                "PROVENANCE_FORCE_GRACE_SECS",
                defaults.force_grace.as_secs(),
            )?),
        };

        if config.environment == Environment::Production {
            config.chain_endpoint()?;
        }
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn network_info(&self) -> Option<&'static NetworkInfo> {
        network::lookup(&self.network)
    }

    /// Gateway endpoint for persisted networks
    pub fn chain_endpoint(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.chain_url {
            return Ok(url.clone());
        }
        self.network_info()
            .map(|n| n.endpoint)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingChainUrl(self.network.clone()))
    }

    /// How the contract registry resolves addresses
    pub fn registry_config(&self) -> RegistryConfig {
        if self.is_development() || self.deploy_contracts {
            RegistryConfig::ephemeral(self.network.clone())
        } else {
            RegistryConfig::persisted(self.network.clone())
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}
