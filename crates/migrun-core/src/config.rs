//! Runner configuration
//!
//! The CLI assembles this from flags, environment variables and `.env`;
//! library callers build it directly.

use std::path::{Path, PathBuf};

use crate::errors::MigrationError;
use crate::model::OrderingPolicy;

pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
pub const DEFAULT_LEDGER_TABLE: &str = "migrations";

/// Whether a script and its ledger insert share a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Script and ledger row commit or roll back together. Requires
    /// transactional DDL, which SQLite and PostgreSQL provide. Scripts
    /// with their own transaction control, or a `-- migrun:no-transaction`
    /// line, are still applied non-transactionally.
    #[default]
    Transactional,
    /// Script runs outside any transaction and the ledger row is written
    /// afterwards. A crash in between re-runs the script on the next
    /// invocation, so every script must be idempotent.
    NonTransactional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub migrations_dir: PathBuf,
    pub ledger_table: String,
    pub ordering: OrderingPolicy,
    pub apply_mode: ApplyMode,
}

impl RunnerConfig {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_ledger_table(mut self, table: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_apply_mode(mut self, apply_mode: ApplyMode) -> Self {
        self.apply_mode = apply_mode;
        self
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Reject settings that would produce unsafe or broken SQL
    pub fn validate(&self) -> Result<(), MigrationError> {
        validate_identifier(&self.ledger_table)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            ordering: OrderingPolicy::default(),
            apply_mode: ApplyMode::default(),
        }
    }
}

/// The ledger table name is interpolated into SQL, so only plain
/// identifiers (`[A-Za-z_][A-Za-z0-9_]*`) are accepted.
pub fn validate_identifier(name: &str) -> Result<(), MigrationError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MigrationError::InvalidInput {
            reason: format!("'{}' is not a valid ledger table name", name),
        })
    }
}
