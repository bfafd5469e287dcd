//! Database connections
//!
//! `Database` is the seam between the runner and a SQL engine. The runner
//! owns exactly one connection per invocation and releases it when the
//! runner is closed or dropped.

use migrun_core::errors::ExError;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

use crate::errors::{connection_error, from_rusqlite, Result};

/// A SQL connection the runner can drive
pub trait Database {
    /// Execute a script of zero or more `;`-separated statements
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Execute one statement with positional text parameters, returning
    /// the number of affected rows
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize>;

    /// Run a query and render every column of every row as text
    /// (NULL becomes an empty string)
    fn query_text_rows(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>>;

    /// Placeholder for the `index`-th (1-based) parameter
    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    /// DDL for the ledger table, in this engine's dialect
    fn ledger_table_sql(&self, table: &str) -> String;

    fn begin(&mut self) -> Result<()> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }

    /// A transaction is open on this connection
    fn in_transaction(&self) -> bool;

    /// Release the connection, reporting any error from doing so
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// SQLite connection
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database file at `path`
    pub fn connect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(connection_error)?;
        let db = Self { conn };
        db.configure()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(connection_error)?;
        let db = Self { conn };
        db.configure()?;
        Ok(db)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(from_rusqlite)?;
        self.conn
            .busy_timeout(Duration::from_secs(5))
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Direct access to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(from_rusqlite)
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        self.conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(from_rusqlite)
    }

    fn query_text_rows(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        let width = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(from_rusqlite)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(from_rusqlite)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(render_value(row.get_ref(i).map_err(from_rusqlite)?)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }

    fn ledger_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                executed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
            table
        )
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| from_rusqlite(e))
    }
}

fn render_value(value: ValueRef<'_>) -> Result<String> {
    Ok(match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map_err(|e| {
                ExError::new(migrun_core::ExErrorKind::Persistence)
                    .with_op("decode_column")
                    .with_message(e.to_string())
            })?
            .to_string(),
    })
}
