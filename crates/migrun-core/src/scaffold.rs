//! Naming for newly scaffolded migration files

use crate::errors::MigrationError;
use crate::model::MigrationName;

/// File name for the next migration after `existing`
///
/// The number is one past the highest numeric prefix, zero-padded to three
/// digits. The description is lower-cased and every run of characters
/// other than ASCII letters and digits collapses to one `_`.
///
/// ```
/// use migrun_core::model::MigrationName;
/// use migrun_core::scaffold::next_file_name;
///
/// let existing = [MigrationName::new("001_init"), MigrationName::new("002_users")];
/// assert_eq!(next_file_name(&existing, "Add posts table").unwrap(), "003_add_posts_table.sql");
/// ```
///
/// # Errors
///
/// `InvalidInput` when the description has no letters or digits, or the
/// highest existing prefix is already `u64::MAX`.
pub fn next_file_name(
    existing: &[MigrationName],
    description: &str,
) -> Result<String, MigrationError> {
    let slug = slugify(description);
    if slug.is_empty() {
        return Err(MigrationError::InvalidInput {
            reason: format!("migration description '{}' is empty", description),
        });
    }

    let next = match existing.iter().filter_map(MigrationName::numeric_prefix).max() {
        None => 1,
        Some(highest) => highest
            .checked_add(1)
            .ok_or_else(|| MigrationError::InvalidInput {
                reason: format!("no migration number left after {}", highest),
            })?,
    };

    Ok(format!("{:03}_{}.sql", next, slug))
}

fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    let mut pending_sep = false;
    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
