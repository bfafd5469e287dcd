//! migrun CLI
//!
//! Command-line interface for the migration runner

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use migrun_core::config::{ApplyMode, RunnerConfig};
use migrun_core::logging_facility::{self, Profile};
use migrun_core::model::OrderingPolicy;
use migrun_core_types::{RunContext, Sensitive};
use migrun_store::{MigrationRunner, SqliteDatabase};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "migrun")]
#[command(about = "migrun - Apply ordered SQL migration files", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database file
    #[arg(long, global = true, env = "MIGRUN_DATABASE", default_value = ".migrun/store.db")]
    pub db: String,

    /// Directory holding the *.sql migration files
    #[arg(long, global = true, env = "MIGRUN_DIR", default_value = "migrations")]
    pub dir: PathBuf,

    /// Ledger table name
    #[arg(long, global = true, env = "MIGRUN_TABLE", default_value = "migrations")]
    pub table: String,

    #[arg(
        long,
        global = true,
        env = "MIGRUN_ORDERING",
        value_enum,
        default_value_t = OrderingArg::Numeric
    )]
    pub ordering: OrderingArg,

    /// Run each script outside a transaction (scripts must be idempotent)
    #[arg(long, global = true, env = "MIGRUN_NO_TRANSACTION")]
    pub no_transaction: bool,

    #[arg(
        long,
        global = true,
        env = "MIGRUN_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingArg {
    /// Numeric prefix as an integer (`2_x` before `10_y`)
    Numeric,
    /// Plain string order of file names
    Lexicographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl GlobalArgs {
    pub fn runner_config(&self) -> RunnerConfig {
        let ordering = match self.ordering {
            OrderingArg::Numeric => OrderingPolicy::Numeric,
            OrderingArg::Lexicographic => OrderingPolicy::Lexicographic,
        };
        let apply_mode = if self.no_transaction {
            ApplyMode::NonTransactional
        } else {
            ApplyMode::Transactional
        };
        RunnerConfig::new(&self.dir)
            .with_ledger_table(&self.table)
            .with_ordering(ordering)
            .with_apply_mode(apply_mode)
    }

    /// Open the database and build a runner for one command
    pub fn open_runner(
        &self,
    ) -> Result<MigrationRunner<SqliteDatabase>, Box<dyn std::error::Error>> {
        let locator = Sensitive::new(PathBuf::from(&self.db));
        if let Some(parent) = locator.expose().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = SqliteDatabase::connect(locator.expose())?;
        let context = RunContext::new().with_initiator("cli");
        tracing::debug!(
            run_id = %context.run_id,
            database = %locator,
            dir = %self.dir.display(),
            table = self.table.as_str(),
            "opening migration runner"
        );
        Ok(MigrationRunner::new(db, self.runner_config())?.with_context(context))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending migrations, optionally through a target
    Up(commands::up::UpArgs),
    /// Remove ledger records from the newest through a target (schema is not reverted)
    Down(commands::down::DownArgs),
    /// Show every migration and whether it is applied
    Status(commands::status::StatusArgs),
    /// Create a new numbered migration file
    New(commands::new::NewArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging_facility::init(match cli.global.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Up(args) => commands::up::execute(args, &cli.global),
        Commands::Down(args) => commands::down::execute(args, &cli.global),
        Commands::Status(args) => commands::status::execute(args, &cli.global),
        Commands::New(args) => commands::new::execute(args, &cli.global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
