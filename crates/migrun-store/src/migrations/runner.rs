//! Migration runner
//!
//! Applies pending migrations in order and rolls the ledger back. One
//! runner owns one connection for the duration of a command; migrations
//! never run in parallel because later scripts depend on earlier schema.

use std::time::Instant;

use migrun_core::config::{ApplyMode, RunnerConfig};
use migrun_core::errors::ExError;
use migrun_core::model::{MigrationFile, MigrationStatus};
use migrun_core::plan::{build_status, plan_down, plan_up};
use migrun_core::{log_op_end, log_op_error, log_op_start};
use migrun_core_types::schema::{OP_DOWN, OP_STATUS, OP_UP};
use migrun_core_types::RunContext;

use super::discovery::list_migrations;
use super::ledger::Ledger;
use crate::db::Database;
use crate::errors::{sql_execution, transaction_misuse, Result};

/// Outcome of `up`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpReport {
    /// Names applied by this call, in order
    pub applied: Vec<String>,
    /// Ledger size before the call
    pub previously_applied: usize,
    /// The requested target was already applied before the call
    pub target_already_applied: bool,
}

/// What a rollback actually undoes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackScope {
    /// Only ledger rows are deleted. No reverse SQL runs and the schema
    /// is left exactly as it was.
    LedgerOnly,
}

/// Outcome of `down`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRollback {
    /// Names removed from the ledger, newest first
    pub removed: Vec<String>,
    pub scope: RollbackScope,
}

impl LedgerRollback {
    /// Always `false`: `down` never touches the schema
    pub fn schema_reverted(&self) -> bool {
        match self.scope {
            RollbackScope::LedgerOnly => false,
        }
    }
}

/// Applies and rolls back migrations against one owned connection
pub struct MigrationRunner<D: Database> {
    db: D,
    config: RunnerConfig,
    context: RunContext,
}

impl<D: Database> MigrationRunner<D> {
    /// # Errors
    ///
    /// `InvalidInput` if the configured ledger table is not a plain identifier.
    pub fn new(db: D, config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            db,
            config,
            context: RunContext::new(),
        })
    }

    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut D {
        &mut self.db
    }

    /// Release the connection, surfacing any close error
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    /// Discover migrations in the configured directory
    pub fn list_migrations(&self) -> Result<Vec<MigrationFile>> {
        list_migrations(&self.config.migrations_dir, self.config.ordering)
    }

    pub fn ensure_ledger(&mut self) -> Result<()> {
        Ledger::new(&self.config.ledger_table).ensure(&mut self.db)
    }

    /// Apply pending migrations, through `target` when given
    ///
    /// Stops at the first failure. Migrations applied earlier in the same
    /// call stay applied and recorded.
    ///
    /// # Errors
    ///
    /// `NotFound` (before any change) for an unknown target,
    /// `SqlExecution` when a script fails, plus discovery and ledger errors.
    pub fn up(&mut self, target: Option<&str>) -> Result<UpReport> {
        let start = Instant::now();
        log_op_start!(
            OP_UP,
            run_id = %self.context.run_id,
            initiator = self.initiator(),
            target = target.unwrap_or("")
        );

        let result = self.up_inner(target);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => {
                log_op_end!(OP_UP, duration_ms = duration_ms, applied = report.applied.len())
            }
            Err(err) => log_op_error!(OP_UP, err.clone(), duration_ms = duration_ms),
        }
        result.map_err(|e| self.tag(e))
    }

    fn up_inner(&mut self, target: Option<&str>) -> Result<UpReport> {
        let ledger = Ledger::new(&self.config.ledger_table);
        ledger.ensure(&mut self.db)?;

        let applied = ledger.applied_names(&mut self.db)?;
        let all = list_migrations(&self.config.migrations_dir, self.config.ordering)?;
        let plan = plan_up(&all, &applied, target)?;

        if plan.target_already_applied {
            tracing::warn!(
                target_migration = target.unwrap_or(""),
                pending_before_target = plan.pending.len(),
                "target migration is already applied; later migrations are left pending"
            );
        }

        let mut report = UpReport {
            applied: Vec::with_capacity(plan.pending.len()),
            previously_applied: applied.len(),
            target_already_applied: plan.target_already_applied,
        };

        if plan.pending.is_empty() {
            tracing::info!("no pending migrations");
            return Ok(report);
        }

        for migration in plan.pending {
            let name = migration.name().as_str();
            tracing::info!(migration = name, "applying migration");
            let started = Instant::now();
            Self::apply_one(&mut self.db, self.config.apply_mode, &ledger, migration)?;
            tracing::info!(
                migration = name,
                duration_ms = started.elapsed().as_millis() as u64,
                "applied migration"
            );
            report.applied.push(name.to_string());
        }

        Ok(report)
    }

    /// Apply one script and record it
    ///
    /// In transactional mode the script and its ledger row commit together.
    /// Scripts that manage their own transaction (see
    /// `MigrationFile::manages_own_transaction`) always run without a
    /// runner transaction. A script that ends the runner's transaction, or
    /// leaves one of its own open, fails before its ledger row is written.
    fn apply_one(
        db: &mut D,
        mode: ApplyMode,
        ledger: &Ledger<'_>,
        migration: &MigrationFile,
    ) -> Result<()> {
        let name = migration.name().as_str();
        let mode = match mode {
            ApplyMode::Transactional if migration.manages_own_transaction() => {
                tracing::info!(
                    migration = name,
                    "script manages its own transaction; applying without a runner transaction"
                );
                ApplyMode::NonTransactional
            }
            other => other,
        };

        match mode {
            ApplyMode::Transactional => {
                db.begin()?;
                match Self::run_and_record(db, ledger, migration) {
                    Ok(()) => db.commit(),
                    Err(err) => {
                        Self::abandon_transaction(db, name);
                        Err(err)
                    }
                }
            }
            ApplyMode::NonTransactional => {
                let executed = db
                    .execute_batch(migration.sql())
                    .map_err(|e| sql_execution(name, &e))
                    .and_then(|()| {
                        if db.in_transaction() {
                            Err(transaction_misuse(
                                name,
                                "script left a transaction open; end it with COMMIT",
                            ))
                        } else {
                            Ok(())
                        }
                    });
                if let Err(err) = executed {
                    Self::abandon_transaction(db, name);
                    return Err(err);
                }
                ledger.record_applied(db, name)
            }
        }
    }

    /// Script then ledger row, inside the transaction opened by the caller
    fn run_and_record(db: &mut D, ledger: &Ledger<'_>, migration: &MigrationFile) -> Result<()> {
        let name = migration.name().as_str();
        db.execute_batch(migration.sql())
            .map_err(|e| sql_execution(name, &e))?;
        if !db.in_transaction() {
            return Err(transaction_misuse(
                name,
                "script ended the runner's transaction; add a `-- migrun:no-transaction` line \
                 or wrap the script in its own BEGIN/COMMIT",
            ));
        }
        ledger.record_applied(db, name)
    }

    fn abandon_transaction(db: &mut D, name: &str) {
        if !db.in_transaction() {
            return;
        }
        if let Err(rollback_err) = db.rollback() {
            tracing::error!(
                migration = name,
                error = %rollback_err,
                "rollback after failed migration also failed"
            );
        }
    }

    /// Remove ledger rows from the newest through `target`
    ///
    /// This is a ledger-only rollback: no compensating SQL is executed and
    /// the schema is unchanged. Re-running `up` afterwards executes the
    /// removed scripts again.
    ///
    /// # Errors
    ///
    /// `MissingTarget` for an empty target, `NotFound` (before any change)
    /// when the target was never applied.
    pub fn down(&mut self, target: &str) -> Result<LedgerRollback> {
        let start = Instant::now();
        log_op_start!(
            OP_DOWN,
            run_id = %self.context.run_id,
            initiator = self.initiator(),
            target = target
        );

        let result = self.down_inner(target);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(rollback) => {
                log_op_end!(
                    OP_DOWN,
                    duration_ms = duration_ms,
                    removed = rollback.removed.len()
                )
            }
            Err(err) => log_op_error!(OP_DOWN, err.clone(), duration_ms = duration_ms),
        }
        result.map_err(|e| self.tag(e))
    }

    fn down_inner(&mut self, target: &str) -> Result<LedgerRollback> {
        let ledger = Ledger::new(&self.config.ledger_table);
        ledger.ensure(&mut self.db)?;

        let newest_first = ledger.applied_newest_first(&mut self.db)?;
        let selected = plan_down(&newest_first, target)?;

        let mut removed = Vec::with_capacity(selected.len());
        for name in selected {
            if ledger.remove(&mut self.db, &name)? {
                tracing::info!(migration = name.as_str(), "removed ledger record");
            } else {
                tracing::warn!(
                    migration = name.as_str(),
                    "ledger record vanished before removal"
                );
            }
            removed.push(name);
        }

        Ok(LedgerRollback {
            removed,
            scope: RollbackScope::LedgerOnly,
        })
    }

    /// Every discovered migration with its ledger state, followed by
    /// ledger rows whose file has been deleted
    pub fn status(&mut self) -> Result<Vec<MigrationStatus>> {
        let start = Instant::now();
        log_op_start!(
            OP_STATUS,
            run_id = %self.context.run_id,
            initiator = self.initiator()
        );

        let result = self.status_inner();
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(statuses) => {
                log_op_end!(OP_STATUS, duration_ms = duration_ms, total = statuses.len())
            }
            Err(err) => log_op_error!(OP_STATUS, err.clone(), duration_ms = duration_ms),
        }
        result.map_err(|e| self.tag(e))
    }

    fn status_inner(&mut self) -> Result<Vec<MigrationStatus>> {
        let ledger = Ledger::new(&self.config.ledger_table);
        ledger.ensure(&mut self.db)?;
        let records = ledger.records(&mut self.db)?;
        let all = list_migrations(&self.config.migrations_dir, self.config.ordering)?;
        Ok(build_status(&all, &records))
    }

    fn initiator(&self) -> &str {
        self.context.initiator.as_deref().unwrap_or("library")
    }

    fn tag(&self, err: ExError) -> ExError {
        err.with_run_id(self.context.run_id.clone())
    }
}
