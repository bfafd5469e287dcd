//! Error helpers for migrun-store
//!
//! Convert driver and filesystem failures into the core `ExError`.

use migrun_core::errors::{ExError, ExErrorKind, MigrationError};

pub use migrun_core::errors::Result;

/// A failed ledger query or statement
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// The database file could not be opened
pub fn connection_error(err: rusqlite::Error) -> ExError {
    MigrationError::Connection {
        reason: err.to_string(),
    }
    .into()
}

pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    MigrationError::Io {
        op: operation.to_string(),
        reason: err.to_string(),
    }
    .into()
}

/// A migration script broke the transaction contract of its apply mode
pub fn transaction_misuse(migration: &str, reason: &str) -> ExError {
    MigrationError::SqlExecution {
        name: migration.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// A migration script failed; keeps the driver message as the reason
pub fn sql_execution(migration: &str, err: &ExError) -> ExError {
    ExError::from(MigrationError::SqlExecution {
        name: migration.to_string(),
        reason: err.message().to_string(),
    })
    .with_source(err.clone())
}
