//! Search command implementation

use crate::cli::render::{patient_row, patients_json};
use crate::cli::commands::report_failure;
use crate::config::DeskConfig;
use crate::core::registry::{PatientQuery, PatientRegistry};
use crate::domain::FhirError;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search criteria as name=value, e.g. family=Garcia birthdate=ge1990-01-01
    pub criteria: Vec<String>,

    /// Maximum number of patients to list (default from configuration)
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,

    /// Only list patients with at least one encounter
    #[arg(long)]
    pub with_encounters: bool,

    /// Print FHIR JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Leave partial or unparsable birth dates unset instead of failing
    #[arg(long)]
    pub lenient_dates: bool,
}

impl SearchArgs {
    fn effective_config(&self, config: &DeskConfig) -> DeskConfig {
        let mut config = config.clone();
        if self.lenient_dates {
            config.server.strict_dates = false;
        }
        config
    }

    /// Execute the search command
    pub async fn execute(
        &self,
        config: &DeskConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            criteria = ?self.criteria,
            with_encounters = self.with_encounters,
            "Searching patients"
        );

        let config = self.effective_config(config);
        let registry = match PatientRegistry::from_config(&config) {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Failed to connect to FHIR server", &e)),
        };

        let query = PatientQuery {
            criteria: self.criteria.clone(),
            max_results: self.max_results,
            only_with_encounters: self.with_encounters,
        };

        let patients = match registry.find_patients(&query, Some(shutdown_signal)).await {
            Ok(p) => p,
            Err(e) => {
                let code = report_failure("Patient search failed", &e);
                if is_birth_date_failure(&e) {
                    println!("   Hint: rerun with --lenient-dates to skip partial birth dates");
                }
                return Ok(code);
            }
        };

        if self.json {
            println!("{}", patients_json(&patients)?);
            return Ok(0);
        }

        if patients.is_empty() {
            println!("No patients found");
            return Ok(0);
        }

        println!(
            "{:<24} {:<32} {:<10} {:<7} PHONE",
            "ID", "NAME", "BORN", "GENDER"
        );
        for patient in &patients {
            println!("{}", patient_row(patient));
        }
        println!();
        println!("{} patient(s)", patients.len());
        Ok(0)
    }
}

fn is_birth_date_failure(error: &FhirError) -> bool {
    matches!(error, FhirError::MalformedResource(message) if message.contains("birthDate"))
}
