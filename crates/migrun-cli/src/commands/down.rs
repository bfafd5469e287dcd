//! Ledger rollback command
//!
//! Usage: migrun down <TARGET>

use clap::Args;

use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct DownArgs {
    /// Oldest ledger entry to remove; everything applied after it goes too
    pub target: Option<String>,
}

pub fn execute(args: DownArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = global.open_runner()?;
    // An absent target is rejected by the runner as MissingTarget
    let rollback = runner.down(args.target.as_deref().unwrap_or_default())?;
    runner.close()?;

    for name in &rollback.removed {
        println!("✓ Removed ledger record {}", name);
    }
    if !rollback.schema_reverted() {
        println!("Ledger-only rollback: the schema is unchanged.");
        println!("Running `migrun up` again will re-execute the removed migrations.");
    }

    Ok(())
}
