//! Migration framework
//!
//! Provides:
//! - Directory discovery with an explicit ordering policy
//! - The applied ledger table
//! - A runner for `up` (apply pending), `down` (ledger-only rollback)
//!   and `status`

mod discovery;
mod ledger;
mod runner;

pub use discovery::{create_migration, list_migrations};
pub use ledger::Ledger;
pub use runner::{LedgerRollback, MigrationRunner, RollbackScope, UpReport};
