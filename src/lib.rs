//! GovGate - Governance Proposal Workflow Engine
//!
//! Gates release-pipeline steps behind on-ledger governance votes. A
//! proposer step submits a version or deployment proposal to a
//! governance registry, notifies voter pipelines over webhooks, and (for
//! versions) blocks until the registry records a quorum decision. A voter
//! step casts one preconfigured vote on the proposal it was notified of.
//!
//! Key principles:
//! - The ledger is the source of truth; nothing is cached or retried
//! - Rejection is an outcome, not an error
//! - Signing keys live in an injected credential store and are zeroized
//!   after use

pub mod error;
pub mod identity;
pub mod ledger;
pub mod webhook;
pub mod workflow;
