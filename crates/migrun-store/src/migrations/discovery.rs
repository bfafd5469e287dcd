//! Migration discovery and scaffolding on the filesystem

use chrono::Utc;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use migrun_core::errors::MigrationError;
use migrun_core::model::{MigrationFile, MigrationName, OrderingPolicy};
use migrun_core::scaffold::next_file_name;
use migrun_core::{log_op_end, log_op_error, log_op_start};
use migrun_core_types::schema::OP_CREATE;

use crate::errors::{io_error, Result};

const MIGRATION_EXTENSION: &str = "sql";

/// Load every `*.sql` file in `dir`, sorted by `ordering`
///
/// Subdirectories and other extensions are ignored. Each file is read in
/// full; its body is executed later as one batch.
///
/// # Errors
///
/// `DirectoryNotFound` if `dir` does not exist, `InvalidMigrationName`
/// if a file cannot be ordered under `ordering`, `Io` otherwise.
pub fn list_migrations(dir: &Path, ordering: OrderingPolicy) -> Result<Vec<MigrationFile>> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MigrationError::DirectoryNotFound {
            path: dir.display().to_string(),
        }
        .into(),
        _ => io_error("read_migrations_dir", e),
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error("read_dir_entry", e))?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != MIGRATION_EXTENSION) {
            continue;
        }

        let name = MigrationName::from_path(&path).ok_or_else(|| {
            MigrationError::InvalidMigrationName {
                file_name: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            }
        })?;
        ordering.validate(&name)?;

        let sql = fs::read_to_string(&path).map_err(|e| io_error("read_migration", e))?;
        migrations.push(MigrationFile::new(name, path, sql));
    }

    migrations.sort_by(|a, b| ordering.compare(a.name(), b.name()));
    tracing::debug!(
        dir = %dir.display(),
        count = migrations.len(),
        %ordering,
        "discovered migrations"
    );
    Ok(migrations)
}

/// Write an empty, numbered migration file into `dir`
///
/// The directory is created if missing. Existing files are never
/// overwritten.
///
/// # Errors
///
/// `InvalidInput` for an empty description or exhausted numbering, `Io`
/// on filesystem failure.
pub fn create_migration(dir: &Path, description: &str) -> Result<PathBuf> {
    let start = Instant::now();
    log_op_start!(OP_CREATE, dir = %dir.display(), description = description);

    let result = write_next_migration(dir, description);
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(path) => {
            log_op_end!(OP_CREATE, duration_ms = duration_ms, path = %path.display())
        }
        Err(err) => log_op_error!(OP_CREATE, err.clone(), duration_ms = duration_ms),
    }
    result
}

fn write_next_migration(dir: &Path, description: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| io_error("create_migrations_dir", e))?;

    let existing: Vec<MigrationName> = list_migrations(dir, OrderingPolicy::Lexicographic)?
        .into_iter()
        .map(|m| m.name().clone())
        .collect();
    let file_name = next_file_name(&existing, description)?;
    let path = dir.join(&file_name);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| io_error("create_migration", e))?;
    file.write_all(template(description).as_bytes())
        .map_err(|e| io_error("write_migration", e))?;

    Ok(path)
}

fn template(description: &str) -> String {
    format!(
        "-- Migration: {}\n\
         -- Created: {}\n\
         --\n\
         -- The whole file runs as one batch inside a transaction. Files with\n\
         -- their own BEGIN/COMMIT, or a `-- migrun:no-transaction` line, run\n\
         -- without one; prefer idempotent statements there.\n\n",
        description.trim(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
