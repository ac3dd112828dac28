//! Validate config command implementation
//!
//! Loads and validates the configuration file and, on request, asks the
//! configured server for its CapabilityStatement.

use crate::adapters::fhir::{server_capabilities, Session};
use crate::cli::apply_server_override;
use crate::cli::commands::report_failure;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also contact the server and read its capability statement
    #[arg(long)]
    pub check_server: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str, server: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let mut config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Some(server) = server {
            if let Err(e) = apply_server_override(&mut config, server) {
                return Ok(report_failure("Invalid server override", &e));
            }
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  FHIR Server: {}", config.server.resolved_base_url());
        println!(
            "  Return Preference: {}",
            config.server.return_preference.prefer_header()
        );
        println!("  Auth Type: {:?}", config.server.auth_type);
        println!("  Timeout: {}s", config.server.timeout_seconds);
        println!("  Strict Dates: {}", config.server.strict_dates);
        println!("  Max Results: {}", config.search.max_results);
        if let Some(page_size) = config.search.page_size {
            println!("  Page Size: {page_size}");
        }
        println!();

        if !self.check_server {
            return Ok(0);
        }

        let session = match Session::new(config.server.clone()) {
            Ok(s) => s,
            Err(e) => return Ok(report_failure("Failed to create session", &e)),
        };

        match server_capabilities(&session).await {
            Ok(capabilities) => {
                println!("✅ Server reachable");
                println!(
                    "  FHIR Version: {}",
                    capabilities.fhir_version.as_deref().unwrap_or("unknown")
                );
                println!(
                    "  Software: {}",
                    capabilities.software.as_deref().unwrap_or("unknown")
                );
                for resource_type in ["Patient", "Encounter"] {
                    let mark = if capabilities.supports(resource_type) {
                        "✅"
                    } else {
                        "⚠️ "
                    };
                    println!("  {mark} {resource_type}");
                }
                println!();
                Ok(0)
            }
            Err(e) => Ok(report_failure("Server check failed", &e)),
        }
    }
}
