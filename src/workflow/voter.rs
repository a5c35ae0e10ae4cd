//! Voter-role workflow.
//!
//! Single-shot: resolve the signing identity, build a vote decision from
//! pipeline context, and cast it on the ledger. No polling, no
//! notification. The engine does not deduplicate repeated votes from the
//! same identity; idempotence is the ledger's responsibility.

use super::context::{self, PipelineContext};
use super::{parse_address, parse_commit, OperationType, ProposalKind, VoteDecision};
use crate::error::{ProposalOutcome, WorkflowResult};
use crate::identity::IdentityResolver;
use crate::ledger::{LedgerClient, RegistryAddress};
use tracing::info;

/// Drives the voter role against an open proposal.
pub struct VoteCaster<L, R> {
    ledger: L,
    resolver: R,
    registry: RegistryAddress,
    credential_id: String,
    /// Taken verbatim from configuration.
    accept: bool,
}

impl<L: LedgerClient, R: IdentityResolver> VoteCaster<L, R> {
    pub fn new(
        ledger: L,
        resolver: R,
        registry: RegistryAddress,
        credential_id: &str,
        accept: bool,
    ) -> Self {
        Self {
            ledger,
            resolver,
            registry,
            credential_id: credential_id.to_string(),
            accept,
        }
    }

    /// Cast one vote for the proposal described by the pipeline context.
    pub async fn run(
        &self,
        op: OperationType,
        ctx: &PipelineContext,
    ) -> WorkflowResult<ProposalOutcome> {
        let identity = self.resolver.resolve(&self.credential_id)?;

        let decision = self.build_decision(op, ctx)?;

        match &decision.kind {
            ProposalKind::Version { commit } => {
                self.ledger
                    .cast_version_vote(&identity, &self.registry, commit, decision.accept)
                    .await?;
            }
            ProposalKind::Deployment { target } => {
                self.ledger
                    .cast_deployment_vote(&identity, &self.registry, target, decision.accept)
                    .await?;
            }
        }

        Ok(ProposalOutcome::Submitted)
    }

    /// Build the vote decision, validating the subject before any ledger
    /// call.
    fn build_decision(
        &self,
        op: OperationType,
        ctx: &PipelineContext,
    ) -> WorkflowResult<VoteDecision> {
        let kind = match op {
            OperationType::VersionProposal => {
                info!("Getting given commit hash from environment");
                let commit_hex = ctx.require(context::GIVEN_GIT_COMMIT)?;
                info!("Git commit hash: {}", commit_hex);
                ProposalKind::Version {
                    commit: parse_commit(commit_hex)?,
                }
            }
            OperationType::DeploymentProposal => {
                info!("Getting given contract address from environment");
                let target_hex = ctx.require(context::GIVEN_CONTRACT_ADDRESS)?;
                info!("Contract address: {}", target_hex);
                ProposalKind::Deployment {
                    target: parse_address(target_hex)?,
                }
            }
        };

        Ok(VoteDecision {
            kind,
            accept: self.accept,
        })
    }
}
