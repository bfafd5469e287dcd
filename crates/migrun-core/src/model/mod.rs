pub mod file;
pub mod name;
pub mod record;

pub use file::MigrationFile;
pub use name::{MigrationName, OrderingPolicy};
pub use record::{MigrationRecord, MigrationState, MigrationStatus};
