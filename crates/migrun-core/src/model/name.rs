//! Migration names and the ordering contract
//!
//! A migration's name is its file stem: `001_initial_schema.sql` is
//! named `001_initial_schema`. The order migrations run in is derived
//! from the name alone, so the ordering policy is part of the on-disk
//! contract with whoever writes migration files.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use crate::errors::MigrationError;

/// Unique, orderable migration identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationName(String);

impl MigrationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive the name from a file path (its stem)
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading ASCII digits as a number
    ///
    /// `None` when the name does not start with a digit or the digits do
    /// not fit in a `u64`.
    pub fn numeric_prefix(&self) -> Option<u64> {
        let digits: &str = {
            let end = self
                .0
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(self.0.len());
            &self.0[..end]
        };
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How discovered migrations are put in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Compare the numeric prefix as an integer, then the full name.
    /// `2_users` runs before `10_posts`. Every name must start with a digit.
    #[default]
    Numeric,
    /// Compare raw names byte-wise. Zero-pad prefixes to get numeric order.
    Lexicographic,
}

impl OrderingPolicy {
    /// Check that `name` can be ordered under this policy
    pub fn validate(&self, name: &MigrationName) -> Result<(), MigrationError> {
        match self {
            OrderingPolicy::Lexicographic => Ok(()),
            OrderingPolicy::Numeric => match name.numeric_prefix() {
                Some(_) => Ok(()),
                None => Err(MigrationError::InvalidMigrationName {
                    file_name: name.to_string(),
                    reason: "name must start with a numeric prefix such as 001_".to_string(),
                }),
            },
        }
    }

    pub fn compare(&self, a: &MigrationName, b: &MigrationName) -> Ordering {
        match self {
            OrderingPolicy::Lexicographic => a.as_str().cmp(b.as_str()),
            OrderingPolicy::Numeric => a
                .numeric_prefix()
                .cmp(&b.numeric_prefix())
                .then_with(|| a.as_str().cmp(b.as_str())),
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingPolicy::Numeric => write!(f, "numeric"),
            OrderingPolicy::Lexicographic => write!(f, "lexicographic"),
        }
    }
}
