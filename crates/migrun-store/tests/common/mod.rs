use migrun_core::config::{ApplyMode, RunnerConfig};
use migrun_store::db::{Database, SqliteDatabase};
use migrun_store::errors::Result;
use migrun_store::MigrationRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const CREATE_A: &str = "CREATE TABLE a (id INTEGER PRIMARY KEY);";
pub const CREATE_B: &str = "CREATE TABLE b (id INTEGER PRIMARY KEY);";
pub const CREATE_C: &str = "CREATE TABLE c (id INTEGER PRIMARY KEY);";

/// Scratch workspace with a migrations directory and a database file
pub struct Workspace {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join("migrations")).expect("migrations dir");
        Self { dir }
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.dir.path().join("migrations")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("store.db")
    }

    pub fn write(&self, file_name: &str, sql: &str) -> PathBuf {
        let path = self.migrations_dir().join(file_name);
        fs::write(&path, sql).expect("write migration");
        path
    }

    /// The standard three-migration set
    pub fn write_abc(&self) {
        self.write("001_a.sql", CREATE_A);
        self.write("002_b.sql", CREATE_B);
        self.write("003_c.sql", CREATE_C);
    }

    pub fn config(&self) -> RunnerConfig {
        RunnerConfig::new(self.migrations_dir())
    }

    pub fn runner(&self) -> MigrationRunner<SqliteDatabase> {
        self.runner_with(self.config())
    }

    pub fn runner_with(&self, config: RunnerConfig) -> MigrationRunner<SqliteDatabase> {
        let db = SqliteDatabase::connect(self.db_path()).expect("open db");
        MigrationRunner::new(db, config).expect("runner")
    }

    pub fn non_transactional_runner(&self) -> MigrationRunner<SqliteDatabase> {
        self.runner_with(self.config().with_apply_mode(ApplyMode::NonTransactional))
    }
}

/// Ledger names in application order
#[allow(dead_code)]
pub fn ledger_names(db: &SqliteDatabase) -> Vec<String> {
    let mut stmt = db
        .connection()
        .prepare("SELECT name FROM migrations ORDER BY id")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<std::result::Result<Vec<String>, _>>()
        .unwrap()
}

#[allow(dead_code)]
pub fn table_exists(db: &SqliteDatabase, table: &str) -> bool {
    db.connection()
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .is_ok()
}

#[allow(dead_code)]
pub fn insert_ledger_rows(path: &Path, names: &[&str]) {
    let mut db = SqliteDatabase::connect(path).unwrap();
    let ledger = migrun_store::migrations::Ledger::new("migrations");
    ledger.ensure(&mut db).unwrap();
    for name in names {
        ledger.record_applied(&mut db, name).unwrap();
    }
}

/// Commits whatever transaction is open after each script, the way a
/// driver or script that silently ends transactions would
#[allow(dead_code)]
pub struct SelfCommittingDatabase(pub SqliteDatabase);

impl Database for SelfCommittingDatabase {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.0.execute_batch(sql)?;
        let control = matches!(sql.trim(), "BEGIN" | "COMMIT" | "ROLLBACK");
        if !control && self.0.in_transaction() {
            self.0.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        self.0.execute(sql, params)
    }

    fn query_text_rows(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>> {
        self.0.query_text_rows(sql, params)
    }

    fn placeholder(&self, index: usize) -> String {
        self.0.placeholder(index)
    }

    fn ledger_table_sql(&self, table: &str) -> String {
        self.0.ledger_table_sql(table)
    }

    fn in_transaction(&self) -> bool {
        self.0.in_transaction()
    }

    fn close(self) -> Result<()> {
        self.0.close()
    }
}

/// Wraps a database and records every statement it is asked to run
#[allow(dead_code)]
pub struct RecordingDatabase<D> {
    inner: D,
    pub statements: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl<D: Database> RecordingDatabase<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            statements: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }
}

impl<D: Database> Database for RecordingDatabase<D> {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.log(sql);
        self.inner.execute_batch(sql)
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        self.log(sql);
        self.inner.execute(sql, params)
    }

    fn query_text_rows(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>> {
        self.log(sql);
        self.inner.query_text_rows(sql, params)
    }

    fn placeholder(&self, index: usize) -> String {
        self.inner.placeholder(index)
    }

    fn ledger_table_sql(&self, table: &str) -> String {
        self.inner.ledger_table_sql(table)
    }

    fn in_transaction(&self) -> bool {
        self.inner.in_transaction()
    }

    fn close(self) -> Result<()> {
        self.inner.close()
    }
}
