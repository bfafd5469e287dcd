//! Ledger table access
//!
//! The ledger holds one row per applied migration:
//! `(id auto-increment, name unique, executed_at)`. Row ids grow with
//! application order, which is what `down` relies on.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use migrun_core::errors::MigrationError;
use migrun_core::model::MigrationRecord;

use crate::db::Database;
use crate::errors::Result;

/// Ledger operations bound to one table name
///
/// The table name must already be validated as a plain identifier
/// (`RunnerConfig::validate`).
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    table: &'a str,
}

impl<'a> Ledger<'a> {
    pub fn new(table: &'a str) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &str {
        self.table
    }

    /// Create the ledger table if it does not exist
    pub fn ensure<D: Database>(&self, db: &mut D) -> Result<()> {
        let sql = db.ledger_table_sql(self.table);
        db.execute_batch(&sql)
    }

    /// All applied rows, oldest first
    pub fn records<D: Database>(&self, db: &mut D) -> Result<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, name, executed_at FROM {} ORDER BY id ASC",
            self.table
        );
        db.query_text_rows(&sql, &[])?
            .into_iter()
            .map(parse_record)
            .collect()
    }

    pub fn applied_names<D: Database>(&self, db: &mut D) -> Result<HashSet<String>> {
        let sql = format!("SELECT name FROM {}", self.table);
        Ok(db
            .query_text_rows(&sql, &[])?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// Applied names, most recently applied first
    pub fn applied_newest_first<D: Database>(&self, db: &mut D) -> Result<Vec<String>> {
        let sql = format!("SELECT name FROM {} ORDER BY id DESC", self.table);
        Ok(db
            .query_text_rows(&sql, &[])?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// Insert the row marking `name` as applied now
    pub fn record_applied<D: Database>(&self, db: &mut D, name: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (name, executed_at) VALUES ({}, {})",
            self.table,
            db.placeholder(1),
            db.placeholder(2)
        );
        let executed_at = Utc::now().to_rfc3339();
        db.execute(&sql, &[name, executed_at.as_str()])?;
        Ok(())
    }

    /// Delete the row for `name`, returning whether one existed
    pub fn remove<D: Database>(&self, db: &mut D, name: &str) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE name = {}",
            self.table,
            db.placeholder(1)
        );
        Ok(db.execute(&sql, &[name])? > 0)
    }
}

fn parse_record(row: Vec<String>) -> Result<MigrationRecord> {
    let malformed = |reason: String| MigrationError::Persistence { reason };

    let [id, name, executed_at]: [String; 3] = row
        .try_into()
        .map_err(|row: Vec<String>| malformed(format!("expected 3 ledger columns, got {}", row.len())))?;

    let id = id
        .parse::<i64>()
        .map_err(|e| malformed(format!("bad ledger id '{}': {}", id, e)))?;
    let executed_at = DateTime::parse_from_rfc3339(&executed_at)
        .map_err(|e| malformed(format!("bad executed_at '{}': {}", executed_at, e)))?
        .with_timezone(&Utc);

    Ok(MigrationRecord {
        id,
        name,
        executed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDatabase;

    #[test]
    fn test_ensure_is_idempotent() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let ledger = Ledger::new("migrations");
        ledger.ensure(&mut db).unwrap();
        ledger.ensure(&mut db).unwrap();
        assert!(ledger.records(&mut db).unwrap().is_empty());
    }

    #[test]
    fn test_records_round_trip_in_application_order() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let ledger = Ledger::new("migrations");
        ledger.ensure(&mut db).unwrap();
        ledger.record_applied(&mut db, "002_b").unwrap();
        ledger.record_applied(&mut db, "001_a").unwrap();

        let records = ledger.records(&mut db).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["002_b", "001_a"]);
        assert!(records[0].id < records[1].id);

        let newest_first = ledger.applied_newest_first(&mut db).unwrap();
        assert_eq!(newest_first, vec!["001_a", "002_b"]);
    }

    #[test]
    fn test_name_is_unique() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let ledger = Ledger::new("migrations");
        ledger.ensure(&mut db).unwrap();
        ledger.record_applied(&mut db, "001_a").unwrap();
        assert!(ledger.record_applied(&mut db, "001_a").is_err());
    }

    #[test]
    fn test_remove_reports_missing_rows() {
        let mut db = SqliteDatabase::open_in_memory().unwrap();
        let ledger = Ledger::new("migrations");
        ledger.ensure(&mut db).unwrap();
        ledger.record_applied(&mut db, "001_a").unwrap();

        assert!(ledger.remove(&mut db, "001_a").unwrap());
        assert!(!ledger.remove(&mut db, "001_a").unwrap());
    }

    #[test]
    fn test_parse_record_rejects_bad_timestamp() {
        let row = vec!["1".to_string(), "001_a".to_string(), "yesterday".to_string()];
        assert!(parse_record(row).is_err());
    }
}
