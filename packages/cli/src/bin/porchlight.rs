use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "porchlight")]
#[command(about = "Porchlight - foreclosure help site backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Overrides PORCHLIGHT_PORT
        #[arg(long)]
        port: Option<u16>,
        /// Overrides PORCHLIGHT_DATABASE_PATH
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Print the foreclosure timeline for a notice-of-default date
    Timeline {
        /// Notice date (YYYY-MM-DD)
        date: String,
        #[arg(long, default_value = "standard")]
        variant: String,
        /// Classify milestones against this date instead of today
        #[arg(long)]
        today: Option<String>,
        /// Also list the action items for each milestone
        #[arg(long)]
        actions: bool,
    },
    /// Generate a random value for ADMIN_API_TOKEN
    GenerateToken,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve { port, database } => cli::serve::run(port, database).await,
        Commands::Timeline {
            date,
            variant,
            today,
            actions,
        } => cli::timeline::print(&date, &variant, today.as_deref(), actions),
        Commands::GenerateToken => {
            cli::token::print_new_token();
            Ok(())
        }
    }
}
