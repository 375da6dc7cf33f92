use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use strata::migrate::{FileMigrationProvider, MigrationRun, MigrationStatus, Migrator};
use strata::{Connection, ConnectionOptions, MigrationConfiguration};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database DSN. Defaults to DATABASE_DSN, then to the POSTGRES_* variables
    #[arg(long, value_name = "DSN", global = true)]
    dsn: Option<String>,

    /// Directory containing the .sql migration files
    #[arg(
        long,
        value_name = "PATH",
        env = "STRATA_MIGRATIONS_DIR",
        default_value = "migrations",
        global = true
    )]
    migrations_dir: PathBuf,

    /// Name of the migration history table
    #[arg(long, value_name = "NAME", global = true)]
    table: Option<String>,

    /// Do not hold the advisory lock while migrating
    #[arg(long, global = true)]
    no_lock: bool,

    /// Tolerate applied migrations missing from the migrations directory
    #[arg(long, global = true)]
    ignore_missing: bool,

    /// Refuse to apply a migration sorting before the latest applied one
    #[arg(long, global = true)]
    strict_order: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Apply every pending migration (default)
    Latest,

    /// Apply the next pending migration
    Up,

    /// Revert the most recently applied migrations
    Down {
        /// Number of migrations to revert
        #[arg(long, value_name = "N", default_value_t = 1)]
        steps: usize,
    },

    /// Apply or revert migrations until the given one is the latest applied
    To {
        /// Name of the target migration
        name: String,
    },

    /// List migrations and whether they are applied
    Status,
}

impl Cli {
    fn configuration(&self) -> MigrationConfiguration {
        let configuration = MigrationConfiguration::default()
            .with_locking(!self.no_lock)
            .with_ignore_missing(self.ignore_missing)
            .with_strict_order(self.strict_order);

        match &self.table {
            Some(table) => configuration.with_table_name(table),
            None => configuration,
        }
    }

    fn connection_options(&self) -> strata::Result<ConnectionOptions> {
        match &self.dsn {
            Some(dsn) => ConnectionOptions::try_from(dsn.as_str()),
            None => ConnectionOptions::from_env(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match execute(&cli).await {
        Ok(code) => code,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> strata::Result<ExitCode> {
    let options = cli.connection_options()?;
    let connection = Connection::create(options).connect().await?;
    let migrator = Migrator::new(FileMigrationProvider::new(&cli.migrations_dir))
        .with_configuration(cli.configuration());

    let run = match cli.command.clone().unwrap_or(Commands::Latest) {
        Commands::Latest => migrator.migrate_to_latest(&connection).await?,
        Commands::Up => migrator.migrate_up(&connection).await?,
        Commands::Down { steps } => migrator.migrate_down(&connection, steps).await?,
        Commands::To { name } => migrator.migrate_to(&connection, &name).await?,
        Commands::Status => {
            let status = migrator.status(&connection).await?;
            print_status(&status, cli.json);
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_run(&run, cli.json);
    Ok(if run.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_run(run: &MigrationRun, as_json: bool) {
    if as_json {
        let outcomes: Vec<_> = run
            .outcomes
            .iter()
            .map(|o| {
                json!({
                    "migrationName": o.name,
                    "direction": o.direction.to_string(),
                    "status": if o.is_success() { "Success" } else { "Error" },
                    "error": o.error_detail,
                    "executionTime": o.execution_time,
                })
            })
            .collect();

        let document = json!({
            "results": outcomes,
            "error": run.error.as_ref().map(|e| e.to_string()),
        });
        println!("{}", document);
        return;
    }

    if run.outcomes.is_empty() && run.is_success() {
        println!("Database is up to date");
    }

    for outcome in run.outcomes.iter() {
        if outcome.is_success() {
            println!("{}", outcome);
        } else {
            eprintln!("{}", outcome);
        }
    }

    if let Some(error) = &run.error {
        eprintln!("Failed to migrate: {}", error);
    }
}

fn print_status(status: &[MigrationStatus], as_json: bool) {
    if as_json {
        let migrations: Vec<_> = status
            .iter()
            .map(|s| {
                json!({
                    "migrationName": s.name,
                    "appliedAt": s.applied_at.map(|at| at.to_rfc3339()),
                })
            })
            .collect();
        println!("{}", json!({ "migrations": migrations }));
        return;
    }

    for s in status {
        match s.applied_at {
            Some(applied_at) => println!("[x] {} (applied at {})", s.name, applied_at.to_rfc3339()),
            None => println!("[ ] {}", s.name),
        }
    }
}
