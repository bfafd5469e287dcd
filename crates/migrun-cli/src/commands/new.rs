//! Scaffold command
//!
//! Usage: migrun new <DESCRIPTION>...

use clap::Args;

use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Short description, used for the file name slug
    #[arg(required = true)]
    pub description: Vec<String>,
}

pub fn execute(args: NewArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let description = args.description.join(" ");
    let path = migrun_store::create_migration(&global.dir, &description)?;
    println!("✓ Created {}", path.display());
    Ok(())
}
