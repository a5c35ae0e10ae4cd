//! JSON-RPC ledger client.
//!
//! Talks to a governance gateway colocated with the ledger node. The
//! gateway owns transaction assembly and signing; this client only maps
//! the [`LedgerClient`] contract onto `gov_*` RPC methods.
//!
//! The signing key travels in the request body, so the gateway URL must
//! be a loopback or otherwise trusted endpoint. This mirrors the
//! node-side signing surfaces of common ledger nodes and keeps signing
//! internals out of the engine.

use super::traits::*;
use crate::identity::SigningIdentity;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// [`LedgerClient`] implementation speaking JSON-RPC 2.0 to a governance
/// gateway.
pub struct RpcLedgerClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcLedgerClient {
    /// Create a client for the gateway at `url`.
    pub fn new(url: &str) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::CallFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::CallFailed(format!("{}: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::CallFailed(format!(
                "{}: gateway returned {}",
                method, status
            )));
        }

        let rpc: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::CallFailed(format!("{}: malformed response: {}", method, e)))?;

        if let Some(err) = rpc.error {
            return Err(LedgerError::CallFailed(format!(
                "{}: gateway error {}: {}",
                method, err.code, err.message
            )));
        }

        rpc.result
            .ok_or_else(|| LedgerError::CallFailed(format!("{}: response carried no result", method)))
    }

    async fn send_tx(&self, method: &str, params: Value) -> LedgerResult<TxReceipt> {
        let tx_hash: String = self.call(method, params).await?;
        Ok(TxReceipt { tx_hash })
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn submit_version_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<TxReceipt> {
        self.send_tx(
            "gov_createVersionProposal",
            json!([identity.key_hex(), registry.as_str(), commit.to_string()]),
        )
        .await
    }

    async fn submit_deployment_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<TxReceipt> {
        self.send_tx(
            "gov_createDeploymentProposal",
            json!([identity.key_hex(), registry.as_str(), target.as_str()]),
        )
        .await
    }

    async fn version_accepted(
        &self,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool> {
        self.call(
            "gov_versionProposalAccepted",
            json!([registry.as_str(), commit.to_string()]),
        )
        .await
    }

    async fn version_rejected(
        &self,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool> {
        self.call(
            "gov_versionProposalRejected",
            json!([registry.as_str(), commit.to_string()]),
        )
        .await
    }

    async fn deployment_accepted(
        &self,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool> {
        self.call(
            "gov_deploymentProposalAccepted",
            json!([registry.as_str(), target.as_str()]),
        )
        .await
    }

    async fn deployment_rejected(
        &self,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool> {
        self.call(
            "gov_deploymentProposalRejected",
            json!([registry.as_str(), target.as_str()]),
        )
        .await
    }

    async fn cast_version_vote(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        commit: &CommitHash,
        accept: bool,
    ) -> LedgerResult<TxReceipt> {
        self.send_tx(
            "gov_voteVersionProposal",
            json!([
                identity.key_hex(),
                registry.as_str(),
                commit.to_string(),
                accept
            ]),
        )
        .await
    }

    async fn cast_deployment_vote(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        target: &RegistryAddress,
        accept: bool,
    ) -> LedgerResult<TxReceipt> {
        self.send_tx(
            "gov_voteDeploymentProposal",
            json!([
                identity.key_hex(),
                registry.as_str(),
                target.as_str(),
                accept
            ]),
        )
        .await
    }

    async fn deploy_registry(
        &self,
        identity: &SigningIdentity,
        initial_voters: &[RegistryAddress],
        version_quorum_percent: u8,
        role_binding_quorum_percent: u8,
    ) -> LedgerResult<RegistryAddress> {
        let voters: Vec<&str> = initial_voters.iter().map(|v| v.as_str()).collect();
        let address: String = self
            .call(
                "gov_deployRegistry",
                json!([
                    identity.key_hex(),
                    voters,
                    version_quorum_percent,
                    role_binding_quorum_percent
                ]),
            )
            .await?;

        RegistryAddress::parse(&address)
            .map_err(|_| LedgerError::CallFailed(format!("gateway returned malformed address '{}'", address)))
    }
}
