//! Apply command
//!
//! Usage: migrun up [TARGET]

use clap::Args;

use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct UpArgs {
    /// Stop after this migration (file name without `.sql`)
    pub target: Option<String>,
}

pub fn execute(args: UpArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = global.open_runner()?;
    let report = runner.up(args.target.as_deref())?;
    runner.close()?;

    for name in &report.applied {
        println!("✓ Applied {}", name);
    }
    if report.target_already_applied {
        println!(
            "Target {} was already applied; later migrations are still pending",
            args.target.as_deref().unwrap_or_default()
        );
    }
    if report.applied.is_empty() {
        println!("No pending migrations");
    } else {
        println!("Applied {} migration(s)", report.applied.len());
    }

    Ok(())
}
