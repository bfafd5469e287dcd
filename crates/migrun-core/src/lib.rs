//! migrun core - domain model and planning for the SQL migration runner
//!
//! - Migration names with an explicit ordering policy
//! - Ledger records and the status view
//! - Pure planning for `up` (pending set, target truncation) and `down`
//!   (ledger prefix selection)
//! - Detection of scripts that manage their own transactions
//! - The error facility and structured logging facility shared by the
//!   store and CLI crates
//!
//! Nothing in this crate touches the filesystem or a database.

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod plan;
pub mod scaffold;
pub mod script;

#[doc(hidden)]
pub use migrun_core_types as core_types;

pub use config::{ApplyMode, RunnerConfig};
pub use errors::{ExError, ExErrorKind, MigrationError, Result, TargetScope};
pub use model::{
    MigrationFile, MigrationName, MigrationRecord, MigrationState, MigrationStatus,
    OrderingPolicy,
};
pub use plan::{build_status, plan_down, plan_up, UpPlan};
