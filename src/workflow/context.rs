//! Pipeline execution context.
//!
//! The hosting pipeline supplies subject data through environment
//! values. The engine reads them as plain strings; absence of a required
//! value is a fatal configuration error.

use crate::error::{WorkflowError, WorkflowResult};
use std::collections::HashMap;

/// Commit hash of the build under proposal (proposer, version flow).
pub const GIT_COMMIT: &str = "GIT_COMMIT";
/// Freshly deployed address under proposal (proposer, deployment flow).
pub const CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
/// Commit hash of the proposal being voted on (voter flow).
pub const GIVEN_GIT_COMMIT: &str = "GIVEN_GIT_COMMIT";
/// Deployed address of the proposal being voted on (voter flow).
pub const GIVEN_CONTRACT_ADDRESS: &str = "GIVEN_CONTRACT_ADDRESS";

/// Environment values supplied by the hosting pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    values: HashMap<String, String>,
}

impl PipelineContext {
    /// Capture the process environment.
    pub fn from_env() -> Self {
        Self {
            values: std::env::vars().collect(),
        }
    }

    /// Build a context from explicit values (for tests and embedding).
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up an optional value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a required value; absence is a fatal configuration error.
    pub fn require(&self, key: &str) -> WorkflowResult<&str> {
        self.get(key).ok_or_else(|| {
            WorkflowError::Configuration(format!(
                "required pipeline context value '{}' is missing",
                key
            ))
        })
    }
}
