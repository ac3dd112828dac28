//! Create command implementation

use crate::adapters::fhir::cancellable;
use crate::cli::commands::report_failure;
use crate::cli::render::{patient_detail, patients_json};
use crate::config::DeskConfig;
use crate::core::registry::{parse_date_argument, PatientRegistry, Registration};
use crate::domain::AdministrativeGender;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Family name
    #[arg(long)]
    pub family: String,

    /// Given name (repeat for several)
    #[arg(short, long)]
    pub given: Vec<String>,

    /// Date of birth as YYYY-MM-DD
    #[arg(short, long)]
    pub birth_date: Option<String>,

    /// Administrative gender (male, female, other, unknown)
    #[arg(long)]
    pub gender: Option<AdministrativeGender>,

    /// Home phone number
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Print the stored resource as FHIR JSON
    #[arg(long)]
    pub json: bool,
}

impl CreateArgs {
    /// Execute the create command
    pub async fn execute(
        &self,
        config: &DeskConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(family = %self.family, "Registering patient");

        let birth_date = match self.birth_date.as_deref().map(parse_date_argument).transpose() {
            Ok(d) => d,
            Err(e) => return Ok(report_failure("Invalid birth date", &e)),
        };

        let registration = Registration {
            family: self.family.clone(),
            given: self.given.clone(),
            birth_date,
            gender: self.gender,
            home_phone: self.phone.clone(),
        };

        let registry = match PatientRegistry::from_config(config) {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Failed to connect to FHIR server", &e)),
        };

        let patient = match cancellable(&mut shutdown, registry.register(&registration)).await {
            Ok(p) => p,
            Err(e) => return Ok(report_failure("Failed to register patient", &e)),
        };

        if self.json {
            println!("{}", patients_json(std::slice::from_ref(&patient))?);
        } else {
            println!("✅ Patient registered");
            println!("{}", patient_detail(&patient));
        }
        Ok(0)
    }
}
