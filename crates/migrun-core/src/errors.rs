use migrun_core_types::RunId;
use thiserror::Error;

/// Result type alias used throughout the runner
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code. The CLI prints the code so deployment
/// scripts can branch on it without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Environment
    Connection,
    DirectoryNotFound,
    Io,

    // Selection
    NotFound,
    MissingTarget,

    // Input
    InvalidMigrationName,
    InvalidInput,

    // Execution
    SqlExecution,
    Persistence,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Connection => "ERR_CONNECTION",
            ExErrorKind::DirectoryNotFound => "ERR_DIRECTORY_NOT_FOUND",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::MissingTarget => "ERR_MISSING_TARGET",
            ExErrorKind::InvalidMigrationName => "ERR_INVALID_MIGRATION_NAME",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::SqlExecution => "ERR_SQL_EXECUTION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the operation and migration it
/// happened in, so a log line or CLI message can be produced without
/// string matching.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    migration: Option<String>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            migration: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the name of the migration involved
    pub fn with_migration(mut self, name: impl Into<String>) -> Self {
        self.migration = Some(name.into());
        self
    }

    /// Add run correlation id
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn migration(&self) -> Option<&str> {
        self.migration.as_deref()
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(migration) = &self.migration {
            write!(f, " (migration: {})", migration)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Which list a target name was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    /// The migrations discovered in the directory
    Directory,
    /// The applied ledger
    Ledger,
}

impl std::fmt::Display for TargetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetScope::Directory => write!(f, "migrations directory"),
            TargetScope::Ledger => write!(f, "applied ledger"),
        }
    }
}

/// Domain error taxonomy for runner operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// The database could not be opened
    #[error("Cannot connect to database: {reason}")]
    Connection { reason: String },

    /// The configured migrations directory does not exist
    #[error("Migrations directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// A named target is absent from the list it was looked up in
    #[error("Migration {name} not found in {scope}")]
    NotFound { name: String, scope: TargetScope },

    /// `down` was invoked without a target
    #[error("A target migration name is required")]
    MissingTarget,

    /// A migration script failed to execute
    #[error("Migration {name} failed: {reason}")]
    SqlExecution { name: String, reason: String },

    /// A file name cannot be ordered under the active policy
    #[error("Invalid migration file name {file_name}: {reason}")]
    InvalidMigrationName { file_name: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Reading or writing the ledger failed
    #[error("Ledger access failed: {reason}")]
    Persistence { reason: String },

    #[error("I/O error during {op}: {reason}")]
    Io { op: String, reason: String },
}

impl From<MigrationError> for ExError {
    fn from(err: MigrationError) -> Self {
        let message = err.to_string();
        match err {
            MigrationError::Connection { .. } => ExError::new(ExErrorKind::Connection)
                .with_op("connect")
                .with_message(message),

            MigrationError::DirectoryNotFound { .. } => {
                ExError::new(ExErrorKind::DirectoryNotFound)
                    .with_op("list_migrations")
                    .with_message(message)
            }

            MigrationError::NotFound { name, scope } => ExError::new(ExErrorKind::NotFound)
                .with_op(match scope {
                    TargetScope::Directory => "resolve_up_target",
                    TargetScope::Ledger => "resolve_down_target",
                })
                .with_migration(name)
                .with_message(message),

            MigrationError::MissingTarget => ExError::new(ExErrorKind::MissingTarget)
                .with_op("resolve_down_target")
                .with_message(message),

            MigrationError::SqlExecution { name, .. } => ExError::new(ExErrorKind::SqlExecution)
                .with_op("apply_migration")
                .with_migration(name)
                .with_message(message),

            MigrationError::InvalidMigrationName { file_name, .. } => {
                ExError::new(ExErrorKind::InvalidMigrationName)
                    .with_op("list_migrations")
                    .with_migration(file_name)
                    .with_message(message)
            }

            MigrationError::InvalidInput { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            MigrationError::Persistence { .. } => ExError::new(ExErrorKind::Persistence)
                .with_op("ledger")
                .with_message(message),

            MigrationError::Io { op, .. } => ExError::new(ExErrorKind::Io)
                .with_op(op)
                .with_message(message),
        }
    }
}
