// fhirdesk - FHIR patient record client
// Copyright (c) 2025 fhirdesk Contributors
// Licensed under the MIT License

use clap::Parser;
use fhirdesk::cli::{Cli, Commands};
use fhirdesk::config::{DeskConfig, LoggingConfig};
use fhirdesk::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = cli.load_config();
    let (log_level, logging_config) = match &config {
        Ok(c) => (
            cli.log_level
                .clone()
                .unwrap_or_else(|| c.application.log_level.clone()),
            c.logging.clone(),
        ),
        Err(_) => (
            cli.log_level.clone().unwrap_or_else(|| "info".to_string()),
            LoggingConfig::default(),
        ),
    };
    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        "fhirdesk - FHIR patient record client"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received SIGINT (Ctrl+C), cancelling");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    let exit_code = match execute_command(&cli, config, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // The logging guard is not dropped by process::exit
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    config: fhirdesk::domain::Result<DeskConfig>,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    let config = match (&cli.command, config) {
        (Commands::Init(args), _) => return args.execute().await,
        (Commands::ValidateConfig(args), _) => {
            return args.execute(&cli.config, cli.server.as_deref()).await
        }
        (_, Ok(config)) => config,
        (_, Err(e)) => {
            println!("❌ Failed to load configuration");
            println!("   Error: {e}");
            return Ok(2);
        }
    };

    match &cli.command {
        Commands::Search(args) => args.execute(&config, shutdown_signal).await,
        Commands::Create(args) => args.execute(&config, shutdown_signal).await,
        Commands::Read(args) => args.execute(&config, shutdown_signal).await,
        Commands::Update(args) => args.execute(&config, shutdown_signal).await,
        Commands::Delete(args) => args.execute(&config, shutdown_signal).await,
        Commands::Init(_) | Commands::ValidateConfig(_) => Ok(0),
    }
}
