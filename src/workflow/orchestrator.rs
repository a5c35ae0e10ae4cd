//! Proposer-role workflow.
//!
//! State machine: `Building -> Submitted -> Polling -> {Accepted,
//! Rejected}`. Building resolves the signing identity and validates the
//! subject; Submitted records the proposal on the ledger; both flows then
//! notify the configured webhook targets. Only the version flow polls for
//! a decision — the deployment flow submits, notifies, and returns
//! (fire-and-forget). That asymmetry is intentional.
//!
//! The polling wait is cancellable: sending on (or dropping) the paired
//! watch channel terminates the loop with a distinct `Cancelled` outcome
//! within one interval.

use super::context::{self, PipelineContext};
use super::{parse_address, parse_commit, OperationType};
use crate::error::{ProposalOutcome, WorkflowError, WorkflowResult};
use crate::identity::IdentityResolver;
use crate::ledger::{CommitHash, LedgerClient, RegistryAddress};
use crate::webhook::{NotifyParams, WebhookNotifier, WebhookTarget};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

/// Default wait between decision polls, carried from the source system.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Polling behavior of the version flow.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Wait between decision queries.
    pub interval: Duration,
    /// Optional bound on total polling time. `None` polls until the
    /// ledger decides or the step is cancelled.
    pub deadline: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

/// A cancellation handle for the polling loop. Send on it (or drop it)
/// to cancel.
pub type CancelSignal = watch::Receiver<()>;

/// Create a cancellation channel pair. The receiver goes to
/// [`ProposalOrchestrator::run`]; the sender stays with the host.
pub fn cancel_channel() -> (watch::Sender<()>, CancelSignal) {
    watch::channel(())
}

/// Drives the proposer role: builds a proposal from pipeline context,
/// submits it, notifies webhook targets, and (version flow only) polls
/// the ledger for the decision.
pub struct ProposalOrchestrator<L, R> {
    ledger: L,
    resolver: R,
    notifier: WebhookNotifier,
    registry: RegistryAddress,
    credential_id: String,
    targets: Vec<WebhookTarget>,
    poll: PollSettings,
}

impl<L: LedgerClient, R: IdentityResolver> ProposalOrchestrator<L, R> {
    /// Construct the orchestrator, resolving the credential once for
    /// early operator feedback. The resolved material is discarded; the
    /// run resolves again at execution time, so a credential rotated in
    /// between is picked up and a revoked one fails the run.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: L,
        resolver: R,
        notifier: WebhookNotifier,
        registry: RegistryAddress,
        credential_id: &str,
        targets: Vec<WebhookTarget>,
        poll: PollSettings,
    ) -> WorkflowResult<Self> {
        resolver.resolve(credential_id)?;

        Ok(Self {
            ledger,
            resolver,
            notifier,
            registry,
            credential_id: credential_id.to_string(),
            targets,
            poll,
        })
    }

    /// Execute one proposer-role pipeline step.
    pub async fn run(
        &self,
        op: OperationType,
        ctx: &PipelineContext,
        cancel: CancelSignal,
    ) -> WorkflowResult<ProposalOutcome> {
        match op {
            OperationType::VersionProposal => self.run_version(ctx, cancel).await,
            OperationType::DeploymentProposal => self.run_deployment(ctx).await,
        }
    }

    async fn run_version(
        &self,
        ctx: &PipelineContext,
        cancel: CancelSignal,
    ) -> WorkflowResult<ProposalOutcome> {
        // Building: validate everything before the first ledger call.
        let identity = self.resolver.resolve(&self.credential_id)?;

        info!("Getting commit hash from environment");
        let commit_hex = ctx.require(context::GIT_COMMIT)?;
        info!("Git commit hash: {}", commit_hex);
        let commit = parse_commit(commit_hex)?;

        // Submitted.
        self.ledger
            .submit_version_proposal(&identity, &self.registry, &commit)
            .await?;
        drop(identity);

        let params = NotifyParams::version(&self.registry, commit_hex);
        self.notifier.notify(&self.targets, &params).await?;

        // Polling.
        self.poll_version(&commit, cancel).await
    }

    async fn run_deployment(&self, ctx: &PipelineContext) -> WorkflowResult<ProposalOutcome> {
        let identity = self.resolver.resolve(&self.credential_id)?;

        info!("Getting commit hash from environment");
        let commit_hex = ctx.require(context::GIT_COMMIT)?;
        info!("Git commit hash: {}", commit_hex);

        info!("Getting newly deployed contract address from environment");
        let target_hex = ctx.require(context::CONTRACT_ADDRESS)?;
        info!("Contract address: {}", target_hex);
        let target = parse_address(target_hex)?;

        self.ledger
            .submit_deployment_proposal(&identity, &self.registry, &target)
            .await?;
        drop(identity);

        let params = NotifyParams::deployment(&self.registry, &target, commit_hex);
        self.notifier.notify(&self.targets, &params).await?;

        // The deployment flow does not wait for a decision.
        Ok(ProposalOutcome::Submitted)
    }

    /// Interval-based decision loop. The `accepted` predicate is queried
    /// first; when it holds, `rejected` is not evaluated that iteration.
    /// The decision is computed fresh each iteration, never cached.
    async fn poll_version(
        &self,
        commit: &CommitHash,
        mut cancel: CancelSignal,
    ) -> WorkflowResult<ProposalOutcome> {
        let deadline_at = self.poll.deadline.map(|d| Instant::now() + d);

        loop {
            let wait = match deadline_at {
                Some(at) => {
                    let now = Instant::now();
                    if now >= at {
                        return Err(WorkflowError::PollDeadline(
                            self.poll.deadline.unwrap_or_default(),
                        ));
                    }
                    self.poll.interval.min(at - now)
                }
                None => self.poll.interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.changed() => {
                    info!("Polling cancelled by the hosting pipeline");
                    return Ok(ProposalOutcome::Cancelled);
                }
            }

            if let Some(at) = deadline_at {
                if Instant::now() >= at {
                    return Err(WorkflowError::PollDeadline(
                        self.poll.deadline.unwrap_or_default(),
                    ));
                }
            }

            info!("Checking if version proposal is accepted or rejected");
            if self
                .ledger
                .version_accepted(&self.registry, commit)
                .await?
            {
                return Ok(ProposalOutcome::Accepted);
            }
            if self
                .ledger
                .version_rejected(&self.registry, commit)
                .await?
            {
                info!("Version proposal was rejected");
                return Ok(ProposalOutcome::Rejected);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MockIdentityResolver;
    use crate::ledger::mock::{MockLedgerClient, RecordedCall};

    const VALID_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const COMMIT_HEX: &str =
        "abababababababababababababababababababababababababababababababab";

    fn registry() -> RegistryAddress {
        RegistryAddress::parse("0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae").unwrap()
    }

    fn orchestrator(
        ledger: MockLedgerClient,
        poll: PollSettings,
    ) -> ProposalOrchestrator<MockLedgerClient, MockIdentityResolver> {
        ProposalOrchestrator::new(
            ledger,
            MockIdentityResolver::with_key("proposer", VALID_KEY),
            WebhookNotifier::new(false),
            registry(),
            "proposer",
            Vec::new(),
            poll,
        )
        .unwrap()
    }

    fn version_ctx() -> PipelineContext {
        PipelineContext::from_values([(context::GIT_COMMIT, COMMIT_HEX)])
    }

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(60),
            deadline: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_on_first_poll() {
        let ledger = MockLedgerClient::new();
        ledger.script_poll(true, false);
        let orch = orchestrator(ledger.clone(), fast_poll());

        let (_tx, rx) = cancel_channel();
        let outcome = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap();

        assert_eq!(outcome, ProposalOutcome::Accepted);
        assert_eq!(ledger.poll_iterations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_rejected_takes_two_iterations() {
        let ledger = MockLedgerClient::new();
        ledger.script_poll(false, false);
        ledger.script_poll(false, true);
        let orch = orchestrator(ledger.clone(), fast_poll());

        let (_tx, rx) = cancel_channel();
        let outcome = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap();

        assert_eq!(outcome, ProposalOutcome::Rejected);
        assert_eq!(ledger.poll_iterations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_takes_precedence_over_rejected() {
        let ledger = MockLedgerClient::new();
        ledger.script_poll(true, true);
        let orch = orchestrator(ledger.clone(), fast_poll());

        let (_tx, rx) = cancel_channel();
        let outcome = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap();

        assert_eq!(outcome, ProposalOutcome::Accepted);
        // The rejected predicate is not evaluated on the accepting
        // iteration.
        assert!(!ledger
            .calls()
            .iter()
            .any(|c| matches!(c, RecordedCall::QueryVersionRejected(_))));
    }

    #[tokio::test]
    async fn test_malformed_commit_never_reaches_ledger() {
        let ledger = MockLedgerClient::new();
        let orch = orchestrator(ledger.clone(), fast_poll());
        let ctx = PipelineContext::from_values([(context::GIT_COMMIT, "zz")]);

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::VersionProposal, &ctx, rx)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_commit_is_configuration_error() {
        let ledger = MockLedgerClient::new();
        let orch = orchestrator(ledger.clone(), fast_poll());

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::VersionProposal, &PipelineContext::default(), rx)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Configuration(_)));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_deployment_address_never_reaches_ledger() {
        let ledger = MockLedgerClient::new();
        let orch = orchestrator(ledger.clone(), fast_poll());
        let ctx = PipelineContext::from_values([
            (context::GIT_COMMIT, COMMIT_HEX),
            (context::CONTRACT_ADDRESS, "0x1234"),
        ]);

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::DeploymentProposal, &ctx, rx)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deployment_flow_never_polls() {
        let ledger = MockLedgerClient::new();
        // A scripted rejection must not matter: the deployment flow
        // completes without consulting the decision.
        ledger.script_poll(false, true);
        let orch = orchestrator(ledger.clone(), fast_poll());
        let ctx = PipelineContext::from_values([
            (context::GIT_COMMIT, COMMIT_HEX),
            (
                context::CONTRACT_ADDRESS,
                "0x1111111111111111111111111111111111111111",
            ),
        ]);

        let (_tx, rx) = cancel_channel();
        let outcome = orch
            .run(OperationType::DeploymentProposal, &ctx, rx)
            .await
            .unwrap();

        assert_eq!(outcome, ProposalOutcome::Submitted);
        assert_eq!(ledger.poll_iterations(), 0);
        assert!(matches!(
            ledger.calls()[0],
            RecordedCall::SubmitDeploymentProposal { .. }
        ));
    }

    #[tokio::test]
    async fn test_ledger_failure_is_fatal() {
        let ledger = MockLedgerClient::new();
        ledger.fail_with("node unreachable");
        let orch = orchestrator(ledger, fast_poll());

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Ledger(_)));
    }

    #[tokio::test]
    async fn test_cancellation_observed_within_one_interval() {
        let ledger = MockLedgerClient::new();
        let orch = orchestrator(
            ledger.clone(),
            PollSettings {
                interval: Duration::from_secs(60),
                deadline: None,
            },
        );

        let (tx, rx) = cancel_channel();
        let started = std::time::Instant::now();
        let handle = {
            let ctx = version_ctx();
            tokio::spawn(async move { orch.run(OperationType::VersionProposal, &ctx, rx).await })
        };

        // Signal cancellation while the loop is inside its first wait.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, ProposalOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(60));
        // Cancelled before the first query.
        assert_eq!(ledger.poll_iterations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let ledger = MockLedgerClient::new();
        // Never decides.
        let orch = orchestrator(
            ledger.clone(),
            PollSettings {
                interval: Duration::from_secs(60),
                deadline: Some(Duration::from_secs(90)),
            },
        );

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::PollDeadline(_)));
        // One full interval fits inside the deadline, so exactly one
        // poll iteration ran.
        assert_eq!(ledger.poll_iterations(), 1);
    }

    #[tokio::test]
    async fn test_setup_time_resolution_fails_early() {
        let result = ProposalOrchestrator::new(
            MockLedgerClient::new(),
            MockIdentityResolver::new(),
            WebhookNotifier::new(false),
            registry(),
            "missing",
            Vec::new(),
            PollSettings::default(),
        );
        assert!(matches!(result, Err(WorkflowError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_credential_revoked_between_setup_and_execution() {
        let resolver = MockIdentityResolver::with_key("proposer", VALID_KEY);
        let orch = ProposalOrchestrator::new(
            MockLedgerClient::new(),
            resolver.clone(),
            WebhookNotifier::new(false),
            registry(),
            "proposer",
            Vec::new(),
            fast_poll(),
        )
        .unwrap();

        resolver.remove_key("proposer");

        let (_tx, rx) = cancel_channel();
        let err = orch
            .run(OperationType::VersionProposal, &version_ctx(), rx)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }
}
