//! Workflow error taxonomy and outcome type.
//!
//! Faults abort the pipeline step; a rejected proposal is NOT a fault and
//! travels through [`ProposalOutcome`] instead, so callers can tell "the
//! governance process worked and said no" apart from "the governance
//! process broke".

use crate::identity::IdentityError;
use crate::ledger::traits::LedgerError;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Fatal workflow errors. Nothing here is retried; every variant aborts
/// the enclosing pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Missing or unresolvable identity, missing required pipeline
    /// context value, unreadable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed commit hash, ledger address, or quorum percentage.
    /// Raised before any ledger call is attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// A submit, query, or vote call to the ledger failed.
    #[error("ledger call failed: {0}")]
    Ledger(#[from] LedgerError),

    /// A webhook delivery failed while fail-fast delivery was requested.
    #[error("webhook delivery failed: {0}")]
    WebhookDelivery(String),

    /// The optional polling deadline expired before the ledger recorded
    /// a terminal decision.
    #[error("polling deadline of {0:?} expired without a decision")]
    PollDeadline(std::time::Duration),
}

impl From<IdentityError> for WorkflowError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::NotFound(_) => Self::Configuration(e.to_string()),
            IdentityError::Invalid(_) => Self::Validation(e.to_string()),
            IdentityError::Store(_) => Self::Configuration(e.to_string()),
        }
    }
}

/// Terminal outcome of a workflow invocation.
///
/// `Rejected` and `Cancelled` are expected domain behavior, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The ledger recorded acceptance; the pipeline may proceed.
    Accepted,
    /// The ledger recorded rejection; the pipeline step must fail.
    Rejected,
    /// An external cancellation signal interrupted polling.
    Cancelled,
    /// Submitted (and notified) without waiting for a decision.
    /// This is the terminal state of the deployment flow and of votes.
    Submitted,
}

impl ProposalOutcome {
    /// Process exit status the hosting pipeline sees for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Accepted | Self::Submitted => 0,
            Self::Rejected => 2,
            Self::Cancelled => 3,
        }
    }
}
