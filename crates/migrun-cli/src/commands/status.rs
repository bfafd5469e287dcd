//! Status command
//!
//! Usage: migrun status [--json]

use clap::Args;
use migrun_core::model::MigrationState;

use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Print the status list as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: StatusArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = global.open_runner()?;
    let statuses = runner.status()?;
    runner.close()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    for status in &statuses {
        match &status.state {
            MigrationState::Pending => println!("pending   {}", status.name),
            MigrationState::Applied { executed_at } => {
                println!("applied   {}  {}", status.name, executed_at.to_rfc3339())
            }
            MigrationState::Orphaned { executed_at } => println!(
                "orphaned  {}  {}  (file missing)",
                status.name,
                executed_at.to_rfc3339()
            ),
        }
    }

    let pending = statuses.iter().filter(|s| s.is_pending()).count();
    println!("{} pending of {}", pending, statuses.len());
    Ok(())
}
