use std::path::{Path, PathBuf};

use super::name::MigrationName;

/// A migration script discovered on disk
///
/// The whole file body is one opaque statement batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    name: MigrationName,
    path: PathBuf,
    sql: String,
}

impl MigrationFile {
    pub fn new(name: MigrationName, path: impl Into<PathBuf>, sql: impl Into<String>) -> Self {
        Self {
            name,
            path: path.into(),
            sql: sql.into(),
        }
    }

    pub fn name(&self) -> &MigrationName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The script issues its own transaction control or opts out with
    /// `-- migrun:no-transaction`
    pub fn manages_own_transaction(&self) -> bool {
        crate::script::manages_own_transaction(&self.sql)
    }
}
