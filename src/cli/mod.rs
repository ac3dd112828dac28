//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for fhirdesk using clap.

pub mod commands;
pub mod render;

use crate::config::{known_server, load_config_or_default, DeskConfig};
use crate::domain::Result;
use clap::{Parser, Subcommand};

/// fhirdesk - FHIR patient record client
#[derive(Parser, Debug)]
#[command(name = "fhirdesk")]
#[command(version, about, long_about = None)]
#[command(author = "fhirdesk Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fhirdesk.toml", env = "FHIRDESK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FHIRDESK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// FHIR server to use instead of the configured one: a base URL or one of
    /// local, hapi, firely
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loads the configuration file (defaults if absent) and applies `--server`
    ///
    /// # Errors
    ///
    /// Returns `FhirError::Configuration` if the file or the override is invalid
    pub fn load_config(&self) -> Result<DeskConfig> {
        let mut config = load_config_or_default(&self.config)?;
        if let Some(server) = &self.server {
            apply_server_override(&mut config, server)?;
        }
        Ok(config)
    }
}

/// Points the configuration at another server and revalidates it
pub(crate) fn apply_server_override(config: &mut DeskConfig, server: &str) -> Result<()> {
    config.server.base_url = known_server(server).unwrap_or(server).to_string();
    config.validate().map_err(|e| {
        crate::domain::FhirError::Configuration(format!("Invalid --server '{server}': {e}"))
    })
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search patients
    Search(commands::search::SearchArgs),

    /// Register a new patient
    Create(commands::create::CreateArgs),

    /// Show a patient by id
    Read(commands::read::ReadArgs),

    /// Change a patient's demographics or add a home phone
    Update(commands::update::UpdateArgs),

    /// Delete a patient by id
    Delete(commands::delete::DeleteArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_search() {
        let cli = Cli::parse_from(["fhirdesk", "search", "family=Garcia", "--with-encounters"]);
        assert_eq!(cli.config, "fhirdesk.toml");
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.criteria, vec!["family=Garcia"]);
                assert!(args.with_encounters);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["fhirdesk", "--config", "custom.toml", "read", "123"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Read(_)));
    }

    #[test]
    fn test_cli_parse_server_after_subcommand() {
        let cli = Cli::parse_from(["fhirdesk", "delete", "123", "--server", "hapi"]);
        assert_eq!(cli.server.as_deref(), Some("hapi"));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["fhirdesk", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_create() {
        let cli = Cli::parse_from([
            "fhirdesk",
            "create",
            "--family",
            "Garcia",
            "--given",
            "Ana",
            "--given",
            "Maria",
            "--birth-date",
            "1990-05-12",
            "--gender",
            "female",
        ]);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.family, "Garcia");
                assert_eq!(args.given, vec!["Ana", "Maria"]);
                assert_eq!(args.gender, Some(crate::domain::AdministrativeGender::Female));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["fhirdesk", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_server_override_preset() {
        let mut config = DeskConfig::default();
        apply_server_override(&mut config, "firely").unwrap();
        assert_eq!(config.server.base_url, "http://vonk.fire.ly");

        assert!(apply_server_override(&mut config, "not-a-url").is_err());
    }
}
