//! Read command implementation

use crate::adapters::fhir::cancellable;
use crate::cli::commands::report_failure;
use crate::cli::render::{patient_detail, patients_json};
use crate::config::DeskConfig;
use crate::core::registry::PatientRegistry;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the read command
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Patient id
    pub id: String,

    /// Print the resource as FHIR JSON
    #[arg(long)]
    pub json: bool,
}

impl ReadArgs {
    /// Execute the read command
    pub async fn execute(
        &self,
        config: &DeskConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let registry = match PatientRegistry::from_config(config) {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Failed to connect to FHIR server", &e)),
        };

        let patient = match cancellable(&mut shutdown, registry.lookup(&self.id)).await {
            Ok(p) => p,
            Err(e) => {
                return Ok(report_failure(
                    &format!("Failed to read patient '{}'", self.id),
                    &e,
                ))
            }
        };

        if self.json {
            println!("{}", patients_json(std::slice::from_ref(&patient))?);
        } else {
            println!("{}", patient_detail(&patient));
        }
        Ok(0)
    }
}
