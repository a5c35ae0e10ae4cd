//! Mock ledger client for testing.
//!
//! Records every call and replays a scripted sequence of poll decisions,
//! so tests can assert both what reached the ledger and how many polling
//! iterations a workflow performed.

use super::traits::*;
use crate::identity::SigningIdentity;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Every ledger interaction the mock observed, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    SubmitVersionProposal {
        identity: String,
        registry: RegistryAddress,
        commit: CommitHash,
    },
    SubmitDeploymentProposal {
        identity: String,
        registry: RegistryAddress,
        target: RegistryAddress,
    },
    QueryVersionAccepted(CommitHash),
    QueryVersionRejected(CommitHash),
    QueryDeploymentAccepted(RegistryAddress),
    QueryDeploymentRejected(RegistryAddress),
    CastVersionVote {
        identity: String,
        commit: CommitHash,
        accept: bool,
    },
    CastDeploymentVote {
        identity: String,
        target: RegistryAddress,
        accept: bool,
    },
    DeployRegistry {
        identity: String,
        voters: Vec<RegistryAddress>,
        version_quorum: u8,
        role_binding_quorum: u8,
    },
}

/// One scripted polling iteration: the values the two independent
/// queries report.
#[derive(Debug, Clone, Copy)]
struct PollStep {
    accepted: bool,
    rejected: bool,
}

struct MockState {
    calls: Vec<RecordedCall>,
    poll_script: VecDeque<PollStep>,
    current_step: Option<PollStep>,
    fail_with: Option<String>,
    deployed_address: RegistryAddress,
}

/// Mock ledger client for testing.
#[derive(Clone)]
pub struct MockLedgerClient {
    state: Arc<Mutex<MockState>>,
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                poll_script: VecDeque::new(),
                current_step: None,
                fail_with: None,
                deployed_address: RegistryAddress::parse(
                    "0x00000000000000000000000000000000000000aa",
                )
                .expect("static mock address"),
            })),
        }
    }

    /// Append one polling iteration to the decision script. The
    /// `accepted` query consumes the next step; the `rejected` query
    /// reads the same step.
    pub fn script_poll(&self, accepted: bool, rejected: bool) {
        let mut s = self.state.lock().unwrap();
        s.poll_script.push_back(PollStep { accepted, rejected });
    }

    /// Make every subsequent call fail with `LedgerError::CallFailed`.
    pub fn fail_with(&self, message: &str) {
        let mut s = self.state.lock().unwrap();
        s.fail_with = Some(message.to_string());
    }

    /// Address `deploy_registry` hands back (for test setup).
    pub fn set_deployed_address(&self, address: RegistryAddress) {
        let mut s = self.state.lock().unwrap();
        s.deployed_address = address;
    }

    /// Snapshot of every observed call, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of completed polling iterations (accepted-query count).
    pub fn poll_iterations(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RecordedCall::QueryVersionAccepted(_)
                        | RecordedCall::QueryDeploymentAccepted(_)
                )
            })
            .count()
    }

    fn record(&self, call: RecordedCall) -> LedgerResult<()> {
        let mut s = self.state.lock().unwrap();
        if let Some(msg) = &s.fail_with {
            return Err(LedgerError::CallFailed(msg.clone()));
        }
        s.calls.push(call);
        Ok(())
    }

    fn advance_step(&self) -> bool {
        let mut s = self.state.lock().unwrap();
        let step = s.poll_script.pop_front().unwrap_or(PollStep {
            accepted: false,
            rejected: false,
        });
        s.current_step = Some(step);
        step.accepted
    }

    fn current_rejected(&self) -> bool {
        let s = self.state.lock().unwrap();
        s.current_step.map(|st| st.rejected).unwrap_or(false)
    }

    fn receipt() -> TxReceipt {
        TxReceipt {
            tx_hash: "0xmock".to_string(),
        }
    }
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn submit_version_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<TxReceipt> {
        self.record(RecordedCall::SubmitVersionProposal {
            identity: identity.id().to_string(),
            registry: registry.clone(),
            commit: *commit,
        })?;
        Ok(Self::receipt())
    }

    async fn submit_deployment_proposal(
        &self,
        identity: &SigningIdentity,
        registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<TxReceipt> {
        self.record(RecordedCall::SubmitDeploymentProposal {
            identity: identity.id().to_string(),
            registry: registry.clone(),
            target: target.clone(),
        })?;
        Ok(Self::receipt())
    }

    async fn version_accepted(
        &self,
        _registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool> {
        self.record(RecordedCall::QueryVersionAccepted(*commit))?;
        Ok(self.advance_step())
    }

    async fn version_rejected(
        &self,
        _registry: &RegistryAddress,
        commit: &CommitHash,
    ) -> LedgerResult<bool> {
        self.record(RecordedCall::QueryVersionRejected(*commit))?;
        Ok(self.current_rejected())
    }

    async fn deployment_accepted(
        &self,
        _registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool> {
        self.record(RecordedCall::QueryDeploymentAccepted(target.clone()))?;
        Ok(self.advance_step())
    }

    async fn deployment_rejected(
        &self,
        _registry: &RegistryAddress,
        target: &RegistryAddress,
    ) -> LedgerResult<bool> {
        self.record(RecordedCall::QueryDeploymentRejected(target.clone()))?;
        Ok(self.current_rejected())
    }

    async fn cast_version_vote(
        &self,
        identity: &SigningIdentity,
        _registry: &RegistryAddress,
        commit: &CommitHash,
        accept: bool,
    ) -> LedgerResult<TxReceipt> {
        self.record(RecordedCall::CastVersionVote {
            identity: identity.id().to_string(),
            commit: *commit,
            accept,
        })?;
        Ok(Self::receipt())
    }

    async fn cast_deployment_vote(
        &self,
        identity: &SigningIdentity,
        _registry: &RegistryAddress,
        target: &RegistryAddress,
        accept: bool,
    ) -> LedgerResult<TxReceipt> {
        self.record(RecordedCall::CastDeploymentVote {
            identity: identity.id().to_string(),
            target: target.clone(),
            accept,
        })?;
        Ok(Self::receipt())
    }

    async fn deploy_registry(
        &self,
        identity: &SigningIdentity,
        initial_voters: &[RegistryAddress],
        version_quorum_percent: u8,
        role_binding_quorum_percent: u8,
    ) -> LedgerResult<RegistryAddress> {
        self.record(RecordedCall::DeployRegistry {
            identity: identity.id().to_string(),
            voters: initial_voters.to_vec(),
            version_quorum: version_quorum_percent,
            role_binding_quorum: role_binding_quorum_percent,
        })?;
        Ok(self.state.lock().unwrap().deployed_address.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn identity() -> SigningIdentity {
        SigningIdentity::from_hex("tester", VALID_KEY).unwrap()
    }

    fn registry() -> RegistryAddress {
        RegistryAddress::parse("0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae").unwrap()
    }

    #[tokio::test]
    async fn test_mock_records_submission() {
        let mock = MockLedgerClient::new();
        let commit = CommitHash::from_hex(&"ab".repeat(32)).unwrap();

        mock.submit_version_proposal(&identity(), &registry(), &commit)
            .await
            .unwrap();

        assert_eq!(mock.calls().len(), 1);
        assert!(matches!(
            mock.calls()[0],
            RecordedCall::SubmitVersionProposal { .. }
        ));
    }

    #[tokio::test]
    async fn test_mock_poll_script_sequencing() {
        let mock = MockLedgerClient::new();
        let commit = CommitHash::from_hex(&"ab".repeat(32)).unwrap();
        mock.script_poll(false, false);
        mock.script_poll(false, true);

        assert!(!mock.version_accepted(&registry(), &commit).await.unwrap());
        assert!(!mock.version_rejected(&registry(), &commit).await.unwrap());

        assert!(!mock.version_accepted(&registry(), &commit).await.unwrap());
        assert!(mock.version_rejected(&registry(), &commit).await.unwrap());

        assert_eq!(mock.poll_iterations(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockLedgerClient::new();
        let commit = CommitHash::from_hex(&"ab".repeat(32)).unwrap();
        mock.fail_with("node unreachable");

        let result = mock
            .submit_version_proposal(&identity(), &registry(), &commit)
            .await;
        assert!(matches!(result, Err(LedgerError::CallFailed(_))));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_deploy_registry() {
        let mock = MockLedgerClient::new();
        let voters = vec![registry()];

        let address = mock
            .deploy_registry(&identity(), &voters, 50, 60)
            .await
            .unwrap();
        assert_eq!(
            address,
            RegistryAddress::parse("0x00000000000000000000000000000000000000aa").unwrap()
        );
        assert!(matches!(
            mock.calls()[0],
            RecordedCall::DeployRegistry {
                version_quorum: 50,
                role_binding_quorum: 60,
                ..
            }
        ));
    }
}
