// ABOUTME: `porchlight serve` command
// ABOUTME: Loads configuration, applies flag overrides and runs the API server

use anyhow::Context;
use colored::*;
use porchlight_cli::Config;
use std::path::PathBuf;

pub async fn run(port: Option<u16>, database: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("Invalid configuration")?;

    if let Some(port) = port {
        if port == 0 {
            anyhow::bail!("--port must be between 1 and 65535");
        }
        config.port = port;
    }
    if let Some(database) = database {
        config.database_path = database;
    }

    println!("{}", "Starting Porchlight API server...".green().bold());
    println!("{} http://localhost:{}", "API:".cyan(), config.port);
    println!(
        "{} {}",
        "Database:".cyan(),
        config.database_path.display()
    );
    if config.dev_mode {
        println!(
            "{}",
            "Development mode: admin endpoints are open".yellow()
        );
    }

    porchlight_cli::run_server(config).await
}
