//! Init command implementation
//!
//! Writes a starter `fhirdesk.toml`.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "fhirdesk.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing fhirdesk configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set [server].base_url in {} (or a preset: local, hapi, firely)", self.output);
                println!("  2. For authenticated servers, put FHIRDESK_TOKEN or");
                println!("     FHIRDESK_USERNAME / FHIRDESK_PASSWORD in a .env file");
                println!("  3. Check the server: fhirdesk validate-config --check-server");
                println!("  4. Search patients: fhirdesk search family=Garcia");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# fhirdesk configuration

environment = "development"

[application]
log_level = "info"

[server]
base_url = "http://localhost:8081/fhir"
return_preference = "representation"
timeout_seconds = 30

[search]
max_results = 20
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# fhirdesk configuration
#
# Values of the form ${VAR} are read from the environment (or a .env file).
# Any key can also be overridden with FHIRDESK_<SECTION>_<KEY>, for example
# FHIRDESK_SERVER_BASE_URL or FHIRDESK_SEARCH_MAX_RESULTS.

# development | staging | production
# Production refuses tls_verify = false.
environment = "development"

[application]
# trace | debug | info | warn | error (RUST_LOG overrides)
log_level = "info"

[server]
# FHIR R4 base URL, or a preset:
#   local  -> http://localhost:8081/fhir
#   hapi   -> http://hapi.fhir.org/baseR4/
#   firely -> http://vonk.fire.ly
base_url = "http://localhost:8081/fhir"

# Wire format; only json is supported
preferred_format = "json"

# What create/update return: representation (full resource) | minimal
return_preference = "representation"

# Whole-request and connect timeouts
timeout_seconds = 30
connect_timeout_seconds = 10

# none | basic | bearer
auth_type = "none"
# username = "${FHIRDESK_USERNAME}"
# password = "${FHIRDESK_PASSWORD}"
# token = "${FHIRDESK_TOKEN}"

# Verify server TLS certificates
tls_verify = true

# Reject patients whose birthDate is not a full YYYY-MM-DD date.
# When false, such dates are dropped with a warning.
strict_dates = true

[search]
# Maximum patients listed by one search
max_results = 20
# Page size requested from the server (_count); server default when unset
# page_size = 50

[logging]
# JSON-lines log files in addition to console output
local_enabled = false
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
