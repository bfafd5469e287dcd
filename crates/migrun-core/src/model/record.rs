//! Ledger rows and the per-migration status view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the applied ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Auto-increment id; higher means applied later
    pub id: i64,
    pub name: String,
    pub executed_at: DateTime<Utc>,
}

/// Where a migration stands relative to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MigrationState {
    /// File present, no ledger row
    Pending,
    /// File present and recorded
    Applied { executed_at: DateTime<Utc> },
    /// Recorded, but the file is gone from the directory
    Orphaned { executed_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub name: String,
    #[serde(flatten)]
    pub state: MigrationState,
}

impl MigrationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self.state, MigrationState::Pending)
    }
}
