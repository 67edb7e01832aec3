use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use db_infra::{migration_status, orchestrate_migration, DbConfig};
use migration::MigrationOutcome;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Command {
    /// Apply pending steps
    Up,
    /// Print current and target schema versions
    Status,
}

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Schema migration tool")]
struct Args {
    /// Migration command to run
    #[arg(value_enum)]
    command: Command,

    /// Path to the JSON database config file
    #[arg(long, env = "SERVER_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();

    let config = match DbConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Cannot load config: {e}");
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Up => match orchestrate_migration(&config).await {
            Ok(MigrationOutcome::UpToDate { version }) => {
                println!("Schema already at version {version}");
            }
            Ok(MigrationOutcome::Migrated { from, to }) => {
                println!("Schema migrated from version {from} to {to}");
            }
            Err(e) => {
                eprintln!("Migration failed: {e}");
                std::process::exit(1);
            }
        },
        Command::Status => match migration_status(&config).await {
            Ok(status) => {
                println!("current: {}", status.current);
                println!("target:  {}", status.target);
                if status.is_up_to_date() {
                    println!("pending: none");
                } else {
                    let pending: Vec<String> =
                        status.pending().iter().map(u32::to_string).collect();
                    println!("pending: {}", pending.join(", "));
                }
            }
            Err(e) => {
                eprintln!("Status failed: {e}");
                std::process::exit(1);
            }
        },
    }
}
