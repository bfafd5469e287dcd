//! migrun store - SQL side of the migration runner
//!
//! Provides:
//! - The `Database` connection seam and its SQLite implementation
//! - Migration discovery and scaffolding on disk
//! - The ledger table and the `MigrationRunner`

pub mod db;
pub mod errors;
pub mod migrations;

// Re-export key types
pub use db::{Database, SqliteDatabase};
pub use errors::Result;
pub use migrations::{
    create_migration, list_migrations, LedgerRollback, MigrationRunner, RollbackScope, UpReport,
};
