//! Chain gateway client for persisted networks
//!
//! Forwards deploy/call/send to a JSON gateway in front of the network's
//! RPC node, which owns transaction signing, gas, and ABI encoding:
//!
//! - `POST {url}/deploy` `{network, from, artifact, args}` → `{address}`
//! - `POST {url}/call` `{network, address, interface, method, args}` → `{result}`
//! - `POST {url}/send` `{network, from, address, interface, method, args}` → receipt

use async_trait::async_trait;
use provenance_core::Address;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chain::{ChainClient, ContractArtifact, ContractInterface, Receipt};
use crate::error::{ContractError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chain client speaking to an HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    network: String,
    endpoint: String,
    from: Option<Address>,
    timeout: Duration,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct DeployRequest<'a> {
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    artifact: &'a ContractArtifact,
    args: Vec<Value>,
}

#[derive(Deserialize)]
struct DeployResponse {
    address: Address,
}

#[derive(Serialize)]
struct CallRequest<'a> {
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    address: Address,
    interface: &'a ContractInterface,
    method: &'a str,
    args: Vec<Value>,
}

#[derive(Deserialize)]
struct CallResponse {
    #[serde(default)]
    result: Value,
}

impl HttpChainClient {
    pub fn new(network: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            from: None,
            timeout: DEFAULT_TIMEOUT,
            http_client: reqwest::Client::new(),
        }
    }

    /// Account the gateway signs deployments and transactions with
    pub fn with_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.endpoint, path);
        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ContractError::Call(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "Chain gateway returned error");
            return Err(ContractError::Call(format!(
                "Gateway returned {}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ContractError::InvalidResponse(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    fn network(&self) -> &str {
        &self.network
    }

    async fn deploy(&self, artifact: &ContractArtifact, args: Vec<Value>) -> Result<Address> {
        let request = DeployRequest {
            network: &self.network,
            from: self.from,
            artifact,
            args,
        };
        let response: DeployResponse = self.post("deploy", &request).await?;
        info!(
            network = %self.network,
            contract = %artifact.contract,
            address = %response.address,
            "Deployed contract"
        );
        Ok(response.address)
    }

    async fn call(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        let request = CallRequest {
            network: &self.network,
            from: None,
            address,
            interface,
            method,
            args,
        };
        let response: CallResponse = self.post("call", &request).await?;
        debug!(address = %address, method = %method, "Call returned");
        Ok(response.result)
    }

    async fn send(
        &self,
        address: Address,
        interface: &ContractInterface,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Receipt> {
        let request = CallRequest {
            network: &self.network,
            from: self.from,
            address,
            interface,
            method,
            args,
        };
        let receipt: Receipt = self.post("send", &request).await?;
        debug!(
            address = %address,
            method = %method,
            tx = %receipt.transaction_hash,
            "Transaction sent"
        );
        Ok(receipt)
    }
}
