//! Trait abstraction for governance-registry ledger operations.
//!
//! The ledger itself is an external collaborator; the engine depends on
//! this contract only. Enables mock implementations for unit testing.

use crate::identity::SigningIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A commit hash as the ledger encodes it (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    /// Parse from canonical hex (exactly 64 characters).
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let bytes = hex::decode(s)
            .map_err(|e| LedgerError::InvalidSubject(format!("commit hash is not hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(LedgerError::InvalidSubject(format!(
                "commit hash must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A well-formed ledger address: `0x` followed by 40 hex characters.
///
/// Stored as given; the ledger treats addresses case-insensitively, so
/// equality here is case-insensitive too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryAddress(String);

impl RegistryAddress {
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        let body = s.strip_prefix("0x").ok_or_else(|| {
            LedgerError::InvalidSubject(format!("address '{}' is missing the 0x prefix", s))
        })?;
        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidSubject(format!(
                "address '{}' is not 40 hex characters",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for RegistryAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for RegistryAddress {}

impl std::hash::Hash for RegistryAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegistryAddress {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RegistryAddress> for String {
    fn from(a: RegistryAddress) -> String {
        a.0
    }
}

/// Receipt of a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// Transport failure or contract revert. Always fatal; the engine
    /// never retries.
    #[error("ledger call failed: {0}")]
    CallFailed(String),

    /// Subject data does not match the ledger's expected encoding.
    /// Raised client-side, before any call goes out.
    #[error("invalid subject: {0}")]
    InvalidSubject(String),
}

/// Governance-registry call surface, keyed by registry address.
///
/// One logical registry instance per deployment; `deploy_registry` is the
/// bootstrap path and is outside the per-run hot path.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Record a version proposal for the given commit.
    async fn submit_version_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<TxReceipt>;

    /// Record a deployment proposal for the given target address.
    async fn submit_deployment_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<TxReceipt>;

    /// Has the version proposal reached its acceptance quorum?
    async fn version_accepted(
        &self,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool>;

    /// Has the version proposal reached its rejection quorum?
    async fn version_rejected(
        &self,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool>;

    /// Deployment-proposal equivalents of the two queries above.
    async fn deployment_accepted(
        &self,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool>;

    async fn deployment_rejected(
        &self,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool>;

    /// Cast a vote on a version proposal.
    async fn cast_version_vote(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        commit: &CommitHash,
        accept: bool,
    ) -> LedgerResult<TxReceipt>;

    /// Cast a vote on a deployment proposal.
    async fn cast_deployment_vote(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        target: &RegistryAddress,
        accept: bool,
    ) -> LedgerResult<TxReceipt>;

    /// Deploy a fresh governance registry with the given voter set and
    /// quorum percentages (0-100).
    async fn deploy_registry(
        &self,
        identity: &SigningIdentity,
        initial_voters: &[RegistryAddress],
        version_quorum_percent: u8,
        role_binding_quorum_percent: u8,
    ) -> LedgerResult<RegistryAddress>;
}
