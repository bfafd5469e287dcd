//! Planning: which migrations an `up` or `down` call touches
//!
//! Pure functions over the discovered file list and the ledger, so the
//! selection rules can be tested without a database.

use std::collections::{HashMap, HashSet};

use crate::errors::{MigrationError, TargetScope};
use crate::model::{MigrationFile, MigrationRecord, MigrationState, MigrationStatus};

/// Migrations selected by `up`, in execution order
#[derive(Debug)]
pub struct UpPlan<'a> {
    pub pending: Vec<&'a MigrationFile>,
    /// The requested target was already in the ledger
    pub target_already_applied: bool,
}

/// Select pending migrations, optionally stopping at `target`
///
/// `target` is resolved against the full discovered list, and the plan
/// keeps every unapplied migration positioned at or before it. When the
/// target itself is already applied, only earlier gaps are filled (often
/// nothing); later pending migrations are never run. Surrounding
/// whitespace in `target` is ignored, as in `plan_down`.
///
/// # Errors
///
/// `NotFound` when `target` is not among the discovered migrations.
pub fn plan_up<'a>(
    all: &'a [MigrationFile],
    applied: &HashSet<String>,
    target: Option<&str>,
) -> Result<UpPlan<'a>, MigrationError> {
    let (cutoff, target_already_applied) = match target.map(str::trim) {
        Some(target) => {
            let position = all
                .iter()
                .position(|m| m.name().as_str() == target)
                .ok_or_else(|| MigrationError::NotFound {
                    name: target.to_string(),
                    scope: TargetScope::Directory,
                })?;
            (position + 1, applied.contains(target))
        }
        None => (all.len(), false),
    };

    let pending = all[..cutoff]
        .iter()
        .filter(|m| !applied.contains(m.name().as_str()))
        .collect();

    Ok(UpPlan {
        pending,
        target_already_applied,
    })
}

/// Select ledger rows to remove for `down`
///
/// `applied_newest_first` is the ledger ordered most recent first. The
/// result is the contiguous prefix from the newest row through `target`.
///
/// # Errors
///
/// `MissingTarget` for an empty target, `NotFound` when `target` was
/// never applied.
pub fn plan_down(
    applied_newest_first: &[String],
    target: &str,
) -> Result<Vec<String>, MigrationError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(MigrationError::MissingTarget);
    }

    let position = applied_newest_first
        .iter()
        .position(|name| name == target)
        .ok_or_else(|| MigrationError::NotFound {
            name: target.to_string(),
            scope: TargetScope::Ledger,
        })?;

    Ok(applied_newest_first[..=position].to_vec())
}

/// Merge the directory listing with the ledger
///
/// Files come first in run order; ledger rows without a file follow in
/// the order they were applied.
pub fn build_status(all: &[MigrationFile], records: &[MigrationRecord]) -> Vec<MigrationStatus> {
    let by_name: HashMap<&str, &MigrationRecord> =
        records.iter().map(|r| (r.name.as_str(), r)).collect();
    let on_disk: HashSet<&str> = all.iter().map(|m| m.name().as_str()).collect();

    let mut statuses: Vec<MigrationStatus> = all
        .iter()
        .map(|m| {
            let state = match by_name.get(m.name().as_str()) {
                Some(record) => MigrationState::Applied {
                    executed_at: record.executed_at,
                },
                None => MigrationState::Pending,
            };
            MigrationStatus {
                name: m.name().to_string(),
                state,
            }
        })
        .collect();

    let mut orphans: Vec<&MigrationRecord> = records
        .iter()
        .filter(|r| !on_disk.contains(r.name.as_str()))
        .collect();
    orphans.sort_by_key(|r| r.id);
    statuses.extend(orphans.into_iter().map(|r| MigrationStatus {
        name: r.name.clone(),
        state: MigrationState::Orphaned {
            executed_at: r.executed_at,
        },
    }));

    statuses
}
