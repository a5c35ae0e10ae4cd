//! Governance workflow engine.
//!
//! Two independent entry points, invoked once per pipeline run:
//! [`orchestrator::ProposalOrchestrator`] drives the proposer role,
//! [`voter::VoteCaster`] the voter role. Both resolve a signing identity
//! and talk to the ledger through the [`crate::ledger::LedgerClient`]
//! trait; the orchestrator additionally fans out webhook notifications.

pub mod context;
pub mod orchestrator;
pub mod voter;

pub use context::PipelineContext;
pub use orchestrator::ProposalOrchestrator;
pub use voter::VoteCaster;

use crate::error::{WorkflowError, WorkflowResult};
use crate::ledger::{CommitHash, RegistryAddress};

/// Which proposal operation a pipeline step performs. Selected by
/// configuration; the subject data comes from the pipeline context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    VersionProposal,
    DeploymentProposal,
}

/// The subject of a governance decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalKind {
    /// A software version, identified by its commit hash.
    Version { commit: CommitHash },
    /// A deployment, identified by the deployed address.
    Deployment { target: RegistryAddress },
}

/// A proposal as recorded on the ledger. Immutable once submitted; the
/// in-process value is discarded when the step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub kind: ProposalKind,
    pub registry: RegistryAddress,
}

/// A vote to be cast against an open proposal. Created fresh per voter
/// invocation, submitted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteDecision {
    pub kind: ProposalKind,
    pub accept: bool,
}

/// Parse a commit hash from pipeline context, surfacing malformed input
/// as a validation error before any ledger call.
pub(crate) fn parse_commit(commit_hex: &str) -> WorkflowResult<CommitHash> {
    CommitHash::from_hex(commit_hex)
        .map_err(|e| WorkflowError::Validation(format!("commit hash '{}': {}", commit_hex, e)))
}

/// Parse a ledger address from pipeline context or configuration.
pub(crate) fn parse_address(s: &str) -> WorkflowResult<RegistryAddress> {
    RegistryAddress::parse(s).map_err(|e| WorkflowError::Validation(e.to_string()))
}
