//! Correlation types for a single runner invocation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier shared by every log event of one runner invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new time-ordered RunId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an id supplied by the caller, e.g. a deployment pipeline job id
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through one command
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    /// Free-form label of who started the run (CI job, operator)
    pub initiator: Option<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            initiator: None,
        }
    }

    pub fn with_run_id(run_id: RunId) -> Self {
        Self {
            run_id,
            initiator: None,
        }
    }

    pub fn with_initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = Some(initiator.into());
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
